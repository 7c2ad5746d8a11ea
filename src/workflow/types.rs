/// Core workflow type definitions
///
/// Desired-state workflow definitions and the records the n8n service hands back.
/// Field names follow the n8n public API JSON so the types serialize straight onto the wire.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A complete desired workflow: name, activation flag, nodes and their connections
///
/// Built fresh on every run and never mutated once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Logical name, used as the matching key on the service
    pub name: String,
    /// Whether the service should activate the workflow
    pub active: bool,
    /// Ordered list of nodes
    pub nodes: Vec<Node>,
    /// Edges keyed by source node name
    pub connections: ConnectionGraph,
}

/// A single step of the workflow (trigger, transform or outbound call)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node-kind specific configuration, opaque to this crate
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Identifier unique within the workflow (e.g., "1")
    pub id: String,
    /// Display name, unique within the workflow and referenced by connections
    pub name: String,
    /// Remote node kind (e.g., "n8n-nodes-base.httpRequest")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Version of the node kind
    pub type_version: u32,
    /// Canvas position [x, y]
    pub position: (i32, i32),
}

/// Directed edge target: which node input receives the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Name of the receiving node
    #[serde(rename = "node")]
    pub target_node_name: String,
    /// Connection channel, "main" for regular data flow
    #[serde(rename = "type")]
    pub channel: String,
    /// Input index on the receiving node
    pub index: u32,
}

/// Connection graph in n8n shape: source name -> channel -> output slot -> targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionGraph(BTreeMap<String, BTreeMap<String, Vec<Vec<Connection>>>>);

/// Service-assigned workflow identifier
///
/// Opaque to the client. Kept in the JSON form the service used (string or
/// number) so it is echoed back exactly; compares and displays as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowId {
    Text(String),
    Number(serde_json::Number),
}

/// Workflow as held by the remote service
///
/// Nodes, connections and timestamps are decoded leniently: other workflows on the
/// service are foreign data and must not make the whole listing undecodable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorkflowRecord {
    /// Service-assigned identifier
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub connections: Value,
    /// `None` when absent or not an RFC 3339 timestamp
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "updatedAt",
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkflowDefinition {
    /// Create an empty, inactive workflow
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: false,
            nodes: Vec::new(),
            connections: ConnectionGraph::default(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Append a node, keeping insertion order
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Connect output 0 of `source` to `connection`
    pub fn with_connection(mut self, source: impl Into<String>, connection: Connection) -> Self {
        self.connections.connect(source, connection);
        self
    }

    /// Look up a node by display name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Check structural invariants.
    ///
    /// The name must be non-empty, node ids and node names unique, and every
    /// connection source and target must name a node of this workflow.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDefinition("workflow name is empty".to_string()));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(Error::InvalidDefinition(format!("duplicate node id '{}'", node.id)));
            }
            if !names.insert(node.name.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        for (source, connection) in self.connections.edges() {
            if !names.contains(source) {
                return Err(Error::InvalidDefinition(format!(
                    "connection source '{}' is not a node",
                    source
                )));
            }
            if !names.contains(connection.target_node_name.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "connection '{}' -> '{}' targets an unknown node",
                    source, connection.target_node_name
                )));
            }
        }

        Ok(())
    }
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        type_version: u32,
        position: (i32, i32),
    ) -> Self {
        Self {
            parameters: Map::new(),
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            type_version,
            position,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

impl Connection {
    pub fn new(target_node_name: impl Into<String>, channel: impl Into<String>, index: u32) -> Self {
        Self {
            target_node_name: target_node_name.into(),
            channel: channel.into(),
            index,
        }
    }

    /// Regular data-flow edge into input 0 of `target_node_name`
    pub fn main(target_node_name: impl Into<String>) -> Self {
        Self::new(target_node_name, "main", 0)
    }
}

impl ConnectionGraph {
    /// Add an edge from output 0 of `source`
    pub fn connect(&mut self, source: impl Into<String>, connection: Connection) {
        self.connect_output(source, 0, connection);
    }

    /// Add an edge from a specific output slot of `source`, growing the slot list as needed
    pub fn connect_output(&mut self, source: impl Into<String>, output: usize, connection: Connection) {
        let slots = self
            .0
            .entry(source.into())
            .or_default()
            .entry(connection.channel.clone())
            .or_default();
        if slots.len() <= output {
            slots.resize_with(output + 1, Vec::new);
        }
        slots[output].push(connection);
    }

    /// Ordered outgoing edges of one source node
    pub fn outgoing(&self, source: &str) -> Vec<&Connection> {
        self.0
            .get(source)
            .map(|channels| channels.values().flatten().flatten().collect())
            .unwrap_or_default()
    }

    /// Every edge as (source name, target)
    pub fn edges(&self) -> impl Iterator<Item = (&str, &Connection)> + '_ {
        self.0.iter().flat_map(|(source, channels)| {
            channels
                .values()
                .flatten()
                .flatten()
                .map(move |connection| (source.as_str(), connection))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}

impl RemoteWorkflowRecord {
    /// Record for `definition` under a service-assigned `id`
    pub fn from_definition(id: impl Into<WorkflowId>, definition: &WorkflowDefinition) -> Result<Self> {
        let nodes = definition
            .nodes
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.into(),
            name: definition.name.clone(),
            active: definition.active,
            nodes,
            connections: serde_json::to_value(&definition.connections)?,
            created_at: None,
            updated_at: None,
        })
    }

    /// Whether the remote node list and connection graph equal the desired ones.
    ///
    /// Extra fields the service adds to nodes (webhook ids, credentials) are ignored.
    pub fn matches_definition(&self, definition: &WorkflowDefinition) -> bool {
        let nodes: Option<Vec<Node>> = self
            .nodes
            .iter()
            .map(|node| serde_json::from_value(node.clone()).ok())
            .collect();
        let connections: Option<ConnectionGraph> =
            serde_json::from_value(self.connections.clone()).ok();

        match (nodes, connections) {
            (Some(nodes), Some(connections)) => {
                nodes == definition.nodes && connections == definition.connections
            }
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowId::Text(text) => f.write_str(text),
            WorkflowId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl PartialEq for WorkflowId {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for WorkflowId {}

impl PartialEq<str> for WorkflowId {
    fn eq(&self, other: &str) -> bool {
        match self {
            WorkflowId::Text(text) => text == other,
            WorkflowId::Number(number) => number.to_string() == other,
        }
    }
}

impl PartialEq<&str> for WorkflowId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl From<String> for WorkflowId {
    fn from(id: String) -> Self {
        WorkflowId::Text(id)
    }
}

impl From<&str> for WorkflowId {
    fn from(id: &str) -> Self {
        WorkflowId::Text(id.to_string())
    }
}

impl From<u64> for WorkflowId {
    fn from(id: u64) -> Self {
        WorkflowId::Number(id.into())
    }
}

/// RFC 3339 timestamp, or `None` for any other shape or JSON type
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|parsed| parsed.with_timezone(&Utc)))
}
