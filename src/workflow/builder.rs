/// Blockforge build dispatcher workflow
///
/// Deterministic for fixed inputs: the same name and webhook URL always yield the
/// same node ids, order and connection graph, so repeated registrations converge.

use crate::config::WorkflowConfig;
use crate::workflow::types::{Connection, Node, WorkflowDefinition};
use serde_json::json;

pub const MANUAL_TRIGGER_TYPE: &str = "n8n-nodes-base.manualTrigger";
pub const FUNCTION_TYPE: &str = "n8n-nodes-base.function";
pub const HTTP_REQUEST_TYPE: &str = "n8n-nodes-base.httpRequest";

pub const TRIGGER_NODE: &str = "Manual Trigger";
pub const PREPARE_NODE: &str = "Prepare Build Context";
pub const DISPATCH_NODE: &str = "Trigger Build Webhook";

const BUILD_CONTEXT_CODE: &str = "return [{\n  buildCommand: 'tools/build.ps1 -Config Debug',\n  notes: 'Invoke from a Windows shell configured for vcpkg toolchain.',\n}];";
const BUILD_REQUEST_BODY: &str =
    r#"{"command":"tools/build.ps1 -Config Debug","project":"Blockforge"}"#;

/// Manual trigger -> build context function -> HTTP POST to the build webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherWorkflow {
    name: String,
    webhook_url: String,
}

impl DispatcherWorkflow {
    pub fn new(name: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            webhook_url: webhook_url.into(),
        }
    }

    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self::new(config.name.clone(), config.webhook_url.clone())
    }

    /// Build the inactive three-node definition
    pub fn build(&self) -> WorkflowDefinition {
        let trigger = Node::new("1", TRIGGER_NODE, MANUAL_TRIGGER_TYPE, 1, (260, 300));

        let prepare = Node::new("2", PREPARE_NODE, FUNCTION_TYPE, 1, (540, 300))
            .with_parameter("functionCode", BUILD_CONTEXT_CODE);

        let dispatch = Node::new("3", DISPATCH_NODE, HTTP_REQUEST_TYPE, 2, (820, 300))
            .with_parameter("url", self.webhook_url.as_str())
            .with_parameter("method", "POST")
            .with_parameter("jsonParameters", true)
            .with_parameter("options", json!({}))
            .with_parameter("bodyParametersJson", BUILD_REQUEST_BODY);

        WorkflowDefinition::new(self.name.as_str())
            .with_active(false)
            .with_node(trigger)
            .with_node(prepare)
            .with_node(dispatch)
            .with_connection(TRIGGER_NODE, Connection::main(PREPARE_NODE))
            .with_connection(PREPARE_NODE, Connection::main(DISPATCH_NODE))
    }
}
