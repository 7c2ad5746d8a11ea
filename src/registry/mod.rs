/// Registry Client Layer
///
/// Transport abstraction over the remote service's list/create/update operations.
/// Each operation is exactly one round trip and either returns parsed records or a
/// classified error; nothing here retries.

// HTTP client for the n8n public API
pub mod client;

// In-process registry with call accounting
pub mod memory;

use crate::error::Result;
use crate::workflow::{RemoteWorkflowRecord, WorkflowDefinition, WorkflowId};
use async_trait::async_trait;

pub use client::HttpRegistryClient;
pub use memory::{CallCounts, InMemoryRegistry};

/// Remote workflow registry operations used by the upsert orchestrator
#[async_trait]
pub trait WorkflowRegistry: Send + Sync {
    /// Every workflow the service returns, in service order
    async fn list(&self) -> Result<Vec<RemoteWorkflowRecord>>;

    /// Store `definition` as a new workflow; the service assigns the id
    async fn create(&self, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord>;

    /// Replace the workflow `id` in place with `definition`
    async fn update(&self, id: &WorkflowId, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord>;
}

#[async_trait]
impl<R: WorkflowRegistry + ?Sized> WorkflowRegistry for std::sync::Arc<R> {
    async fn list(&self) -> Result<Vec<RemoteWorkflowRecord>> {
        (**self).list().await
    }

    async fn create(&self, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        (**self).create(definition).await
    }

    async fn update(&self, id: &WorkflowId, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        (**self).update(id, definition).await
    }
}
