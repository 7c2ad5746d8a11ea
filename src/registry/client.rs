/// HTTP registry client for the n8n public API
///
/// GET /workflows, POST /workflows and PATCH /workflows/{id} under the configured
/// API root. Every request carries the API key header and a JSON content type.

use crate::config::RegistryConfig;
use crate::error::{Error, Operation, Result};
use crate::registry::WorkflowRegistry;
use crate::workflow::{RemoteWorkflowRecord, WorkflowDefinition, WorkflowId};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header n8n reads the API key from (X-N8N-API-KEY)
pub const API_KEY_HEADER: &str = "x-n8n-api-key";

/// Content type sent on every request
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// reqwest-backed registry client
///
/// No retries and no explicit timeout: a failed round trip is terminal for that
/// operation and the underlying transport defaults apply.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    /// Client with the credential and content-type headers preinstalled
    client: Client,
    /// API root without trailing slash
    base_url: Url,
}

/// `{ data: [...] }` envelope returned by GET /workflows
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEnvelope {
    data: Vec<RemoteWorkflowRecord>,
    #[serde(default)]
    next_cursor: Option<Value>,
}

/// Update body: the definition with the target id merged in, in its original JSON form
#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    #[serde(flatten)]
    definition: &'a WorkflowDefinition,
    id: &'a WorkflowId,
}

impl HttpRegistryClient {
    /// Create a client for the given registry settings.
    ///
    /// Fails with `Error::Configuration` when the API root is not a hierarchical URL
    /// or the API key cannot be sent as a header.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                Error::configuration(format!("Invalid n8n API root '{}'.", config.base_url))
            })?;

        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            Error::configuration("n8n API key contains characters not allowed in an HTTP header.")
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// API root extended by path segments, each percent-encoded as a single segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn workflows_url(&self) -> Url {
        self.endpoint(&["workflows"])
    }

    fn workflow_url(&self, id: &WorkflowId) -> Url {
        let id = id.to_string();
        self.endpoint(&["workflows", &id])
    }

    /// Attach a pre-encoded JSON body; the content type comes from the default headers
    fn with_json<T: Serialize + ?Sized>(request: RequestBuilder, body: &T) -> Result<RequestBuilder> {
        let bytes = serde_json::to_vec(body)?;
        Ok(request.body(bytes))
    }

    /// Send one request and decode a 2xx JSON body.
    ///
    /// Connection failures, non-2xx statuses and undecodable bodies all map to
    /// `Error::Transport` carrying the status and body when available.
    async fn send<T: DeserializeOwned>(&self, operation: Operation, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(operation, None, e.to_string()))?;

        let status = response.status();
        tracing::debug!("📡 {} response status: {}", operation, status);

        let body = response.text().await.map_err(|e| {
            Error::transport(
                operation,
                Some(status.as_u16()),
                format!("failed to read response body: {}", e),
            )
        })?;

        if !status.is_success() {
            return Err(Error::transport(operation, Some(status.as_u16()), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::transport(
                operation,
                Some(status.as_u16()),
                format!("unexpected response body ({}): {}", e, body),
            )
        })
    }
}

#[async_trait]
impl WorkflowRegistry for HttpRegistryClient {
    async fn list(&self) -> Result<Vec<RemoteWorkflowRecord>> {
        let url = self.workflows_url();
        tracing::debug!("🔍 GET {}", url);

        let request = self.client.get(url);
        let envelope: ListEnvelope = self.send(Operation::List, request).await?;

        if envelope.next_cursor.as_ref().is_some_and(|cursor| !cursor.is_null()) {
            tracing::warn!(
                "⚠️ Workflow list is paginated; only the first page of {} records was searched",
                envelope.data.len()
            );
        }

        Ok(envelope.data)
    }

    async fn create(&self, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        let url = self.workflows_url();
        tracing::debug!("📤 POST {} ({} nodes)", url, definition.nodes.len());

        let request = Self::with_json(self.client.post(url), definition)?;
        self.send(Operation::Create, request).await
    }

    async fn update(&self, id: &WorkflowId, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        let url = self.workflow_url(id);
        tracing::debug!("📤 PATCH {} ({} nodes)", url, definition.nodes.len());

        let payload = UpdatePayload { definition, id };
        let request = Self::with_json(self.client.patch(url), &payload)?;
        self.send(Operation::Update, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Connection, Node};
    use serde_json::json;

    fn config(base_url: &str) -> RegistryConfig {
        RegistryConfig {
            base_url: base_url.to_string(),
            api_key: "key".to_string(),
        }
    }

    #[test]
    fn urls_are_built_under_api_root() {
        let client = HttpRegistryClient::new(&config("http://localhost:5678/api/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5678/api/v1");
        assert_eq!(client.workflows_url().as_str(), "http://localhost:5678/api/v1/workflows");
        assert_eq!(
            client.workflow_url(&WorkflowId::from("42")).as_str(),
            "http://localhost:5678/api/v1/workflows/42"
        );
        assert_eq!(
            client.workflow_url(&WorkflowId::from(7u64)).as_str(),
            "http://localhost:5678/api/v1/workflows/7"
        );
    }

    #[test]
    fn reserved_characters_in_ids_stay_inside_one_path_segment() {
        let client = HttpRegistryClient::new(&config("http://localhost:5678/api/v1")).unwrap();
        let url = client.workflow_url(&WorkflowId::from("a/b?c#d"));

        assert_eq!(url.as_str(), "http://localhost:5678/api/v1/workflows/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn opaque_api_root_is_a_configuration_error() {
        let err = HttpRegistryClient::new(&config("mailto:ops@example.com")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn api_key_with_newline_is_a_configuration_error() {
        let mut bad = config("http://localhost:5678/api/v1");
        bad.api_key = "line\nbreak".to_string();
        let err = HttpRegistryClient::new(&bad).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn update_payload_merges_id_into_definition() {
        let definition = WorkflowDefinition::new("Flow")
            .with_node(Node::new("1", "A", "t", 1, (0, 0)))
            .with_node(Node::new("2", "B", "t", 1, (10, 0)))
            .with_connection("A", Connection::main("B"));
        let id = WorkflowId::from("42");
        let value = serde_json::to_value(UpdatePayload {
            definition: &definition,
            id: &id,
        })
        .unwrap();

        assert_eq!(value["id"], "42");
        assert_eq!(value["name"], "Flow");
        assert_eq!(value["active"], false);
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["connections"]["A"]["main"][0][0], json!({ "node": "B", "type": "main", "index": 0 }));
    }

    #[test]
    fn numeric_ids_are_sent_back_as_numbers() {
        let definition = WorkflowDefinition::new("Flow");
        let record: RemoteWorkflowRecord =
            serde_json::from_value(json!({ "id": 42, "name": "Flow" })).unwrap();
        let value = serde_json::to_value(UpdatePayload {
            definition: &definition,
            id: &record.id,
        })
        .unwrap();

        assert_eq!(value["id"], json!(42));
    }

    #[test]
    fn list_envelope_tolerates_missing_cursor() {
        let envelope: ListEnvelope =
            serde_json::from_value(json!({ "data": [{ "id": "1", "name": "Flow" }] })).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert!(envelope.next_cursor.is_none());
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error_without_status() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client =
            HttpRegistryClient::new(&config(&format!("http://127.0.0.1:{}/api/v1", port))).unwrap();
        let err = client.list().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.operation(), Some(Operation::List));
        assert_eq!(err.status(), None);
    }
}
