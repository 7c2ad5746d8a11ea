/// In-process workflow registry
///
/// Behaves like the remote service for the three operations the orchestrator uses:
/// ids are assigned on create, list preserves insertion order, update replaces a
/// record in place. Every call is counted so callers can assert exactly which
/// round trips an upsert performed.

use crate::error::{Error, Operation, Result};
use crate::registry::WorkflowRegistry;
use crate::workflow::{RemoteWorkflowRecord, WorkflowDefinition, WorkflowId};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list + self.create + self.update
    }
}

/// Lock-free snapshot registry
///
/// Each mutation clones the current record list and swaps the pointer, so a
/// `records()` snapshot taken earlier never changes underneath its holder.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    /// Ordered records as the service would list them
    records: ArcSwap<Vec<RemoteWorkflowRecord>>,
    /// Injected failures per operation: (status, body)
    failures: HashMap<Operation, (u16, String)>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    /// Ids passed to `update`, in call order
    update_targets: Mutex<Vec<WorkflowId>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `records`, listed in the given order
    pub fn with_records(records: Vec<RemoteWorkflowRecord>) -> Self {
        let registry = Self::new();
        registry.records.store(Arc::new(records));
        registry
    }

    /// Make every call to `operation` fail with the given status and body
    pub fn with_failure(mut self, operation: Operation, status: u16, body: impl Into<String>) -> Self {
        self.failures.insert(operation, (status, body.into()));
        self
    }

    /// Current snapshot of stored records
    pub fn records(&self) -> Arc<Vec<RemoteWorkflowRecord>> {
        self.records.load_full()
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            list: self.list_calls.load(Ordering::SeqCst),
            create: self.create_calls.load(Ordering::SeqCst),
            update: self.update_calls.load(Ordering::SeqCst),
        }
    }

    /// Ids passed to `update`, in call order
    pub fn update_targets(&self) -> Vec<WorkflowId> {
        self.update_targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn injected_failure(&self, operation: Operation) -> Result<()> {
        match self.failures.get(&operation) {
            Some((status, body)) => Err(Error::transport(operation, Some(*status), body.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkflowRegistry for InMemoryRegistry {
    async fn list(&self) -> Result<Vec<RemoteWorkflowRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure(Operation::List)?;

        Ok((**self.records.load()).clone())
    }

    async fn create(&self, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure(Operation::Create)?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut record = RemoteWorkflowRecord::from_definition(id, definition)?;
        let now = chrono::Utc::now();
        record.created_at = Some(now);
        record.updated_at = Some(now);

        let current = self.records.load();
        let mut next = (**current).clone();
        next.push(record.clone());
        self.records.store(Arc::new(next));

        tracing::debug!("Stored new workflow '{}' as {}", record.name, record.id);
        Ok(record)
    }

    async fn update(&self, id: &WorkflowId, definition: &WorkflowDefinition) -> Result<RemoteWorkflowRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.update_targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.clone());
        self.injected_failure(Operation::Update)?;

        let current = self.records.load();
        let position = current
            .iter()
            .position(|record| record.id == *id)
            .ok_or_else(|| {
                Error::transport(
                    Operation::Update,
                    Some(404),
                    format!("{{\"message\":\"Not Found\",\"id\":\"{}\"}}", id),
                )
            })?;

        let mut record = RemoteWorkflowRecord::from_definition(id.clone(), definition)?;
        record.created_at = current[position].created_at;
        record.updated_at = Some(chrono::Utc::now());

        let mut next = (**current).clone();
        next[position] = record.clone();
        self.records.store(Arc::new(next));

        tracing::debug!("Replaced workflow {} with '{}'", id, record.name);
        Ok(record)
    }
}
