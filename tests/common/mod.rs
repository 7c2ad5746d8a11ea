//! Fake n8n public API for integration tests
//!
//! Serves GET/POST /api/v1/workflows and PATCH /api/v1/workflows/{id} on an
//! ephemeral loopback port and records every request it receives.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use flowsync::config::{CliArgs, Config, DEFAULT_WEBHOOK_URL, DEFAULT_WORKFLOW_NAME};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-api-key";

/// One request as seen by the fake service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct FakeState {
    workflows: Vec<Value>,
    requests: Vec<RecordedRequest>,
    next_id: u64,
    list_failure: Option<(u16, String)>,
    next_cursor: Option<String>,
}

type Shared = Arc<Mutex<FakeState>>;

/// Running fake service
pub struct FakeN8n {
    pub host: String,
    state: Shared,
}

impl FakeN8n {
    /// Start with the given workflows already stored, in list order
    pub async fn start(workflows: Vec<Value>) -> Self {
        Self::spawn(FakeState {
            workflows,
            ..FakeState::default()
        })
        .await
    }

    /// Start with `workflows` as the first page of a longer listing, advertising `cursor`
    pub async fn with_next_cursor(workflows: Vec<Value>, cursor: &str) -> Self {
        Self::spawn(FakeState {
            workflows,
            next_cursor: Some(cursor.to_string()),
            ..FakeState::default()
        })
        .await
    }

    /// Start a service whose list endpoint always answers `status` with `body`
    pub async fn with_failing_list(status: u16, body: &str) -> Self {
        Self::spawn(FakeState {
            list_failure: Some((status, body.to_string())),
            ..FakeState::default()
        })
        .await
    }

    async fn spawn(initial: FakeState) -> Self {
        let state: Shared = Arc::new(Mutex::new(initial));
        let app = Router::new()
            .route("/api/v1/workflows", get(list_workflows).post(create_workflow))
            .route("/api/v1/workflows/{id}", patch(update_workflow))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            host: format!("http://{}", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn workflows(&self) -> Vec<Value> {
        self.state.lock().unwrap().workflows.clone()
    }

    pub fn args(&self) -> CliArgs {
        CliArgs {
            host: format!("{}/", self.host),
            api_key: Some(API_KEY.to_string()),
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            webhook: DEFAULT_WEBHOOK_URL.to_string(),
            verbose: false,
        }
    }

    pub fn config(&self) -> Config {
        Config::from_args(self.args()).unwrap()
    }
}

fn record(state: &mut FakeState, method: &str, path: String, headers: &HeaderMap, body: &Bytes) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path,
        api_key: header("x-n8n-api-key"),
        content_type: header("content-type"),
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    });
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-n8n-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "unauthorized" }))).into_response()
}

async fn list_workflows(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "GET", "/api/v1/workflows".to_string(), &headers, &Bytes::new());

    if !authorized(&headers) {
        return unauthorized();
    }
    if let Some((status, body)) = &state.list_failure {
        return (StatusCode::from_u16(*status).unwrap(), body.clone()).into_response();
    }

    Json(json!({ "data": state.workflows, "nextCursor": state.next_cursor })).into_response()
}

async fn create_workflow(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "POST", "/api/v1/workflows".to_string(), &headers, &body);

    if !authorized(&headers) {
        return unauthorized();
    }
    let Ok(mut workflow) = serde_json::from_slice::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "invalid json" }))).into_response();
    };

    state.next_id += 1;
    workflow["id"] = json!(format!("wf-{}", state.next_id));
    workflow["createdAt"] = json!("2025-01-01T00:00:00.000Z");
    workflow["updatedAt"] = json!("2025-01-01T00:00:00.000Z");
    state.workflows.push(workflow.clone());

    Json(workflow).into_response()
}

async fn update_workflow(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "PATCH", format!("/api/v1/workflows/{}", id), &headers, &body);

    if !authorized(&headers) {
        return unauthorized();
    }
    let Ok(mut workflow) = serde_json::from_slice::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "invalid json" }))).into_response();
    };

    let Some(position) = state
        .workflows
        .iter()
        .position(|stored| stored["id"].to_string().trim_matches('"') == id)
    else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response();
    };

    workflow["id"] = state.workflows[position]["id"].clone();
    workflow["updatedAt"] = json!("2025-01-02T00:00:00.000Z");
    state.workflows[position] = workflow.clone();

    Json(workflow).into_response()
}
