/// flowsync: idempotent workflow registration for n8n
///
/// Ensures a remote n8n instance holds exactly one workflow with a given name by
/// listing existing workflows and either creating the workflow or updating the
/// matching one in place, keeping its remote id.

// Validated configuration from flags and environment
pub mod config;

// Error taxonomy (configuration vs transport)
pub mod error;

// Workflow definitions, remote records and the dispatcher builder
pub mod workflow;

// Registry client seam: HTTP and in-memory implementations
pub mod registry;

// Name lookup and create-or-update orchestration
pub mod upsert;

// Wiring used by the binary
pub mod app;

// Re-export commonly used types for external consumers
pub use app::register_workflow;
pub use config::Config;
pub use error::{Error, Operation, Result};
pub use registry::{HttpRegistryClient, InMemoryRegistry, WorkflowRegistry};
pub use upsert::{find_by_name, UpsertOrchestrator, UpsertOutcome};
pub use workflow::{
    Connection, DispatcherWorkflow, Node, RemoteWorkflowRecord, WorkflowDefinition, WorkflowId,
};
