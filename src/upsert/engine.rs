/// Upsert orchestration
///
/// Lists existing workflows, matches by name and dispatches to exactly one create
/// or update. The service's answers are trusted as authoritative: no polling, no
/// retries, no second look.

use crate::error::Result;
use crate::registry::WorkflowRegistry;
use crate::upsert::lookup::find_by_name;
use crate::workflow::{RemoteWorkflowRecord, WorkflowDefinition};
use std::fmt;

/// Which branch the upsert took, with the record the service returned
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(RemoteWorkflowRecord),
    Updated(RemoteWorkflowRecord),
}

impl UpsertOutcome {
    pub fn record(&self) -> &RemoteWorkflowRecord {
        match self {
            UpsertOutcome::Created(record) | UpsertOutcome::Updated(record) => record,
        }
    }

    pub fn into_record(self) -> RemoteWorkflowRecord {
        match self {
            UpsertOutcome::Created(record) | UpsertOutcome::Updated(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Created(record) => {
                write!(f, "Created workflow \"{}\" (id={})", record.name, record.id)
            }
            UpsertOutcome::Updated(record) => {
                write!(f, "Updated existing workflow \"{}\" (id={})", record.name, record.id)
            }
        }
    }
}

/// Create-or-update driver over any registry implementation
#[derive(Debug)]
pub struct UpsertOrchestrator<R> {
    registry: R,
}

impl<R: WorkflowRegistry> UpsertOrchestrator<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Ensure the registry holds `definition` under its name.
    ///
    /// Invalid definitions are rejected before any call. A failed `list` aborts
    /// without attempting a write; otherwise exactly one `update` (first name
    /// match) or one `create` follows.
    pub async fn upsert(&self, definition: &WorkflowDefinition) -> Result<UpsertOutcome> {
        definition.validate()?;

        tracing::info!("🔍 Looking up workflow '{}'", definition.name);
        let existing = self.registry.list().await?;
        tracing::debug!("📋 Registry returned {} workflows", existing.len());

        match find_by_name(&existing, &definition.name) {
            Some(found) => {
                if found.matches_definition(definition) {
                    tracing::debug!("Remote workflow {} already matches the desired graph", found.id);
                }

                tracing::info!("♻️ Updating workflow '{}' (id={})", definition.name, found.id);
                let record = self.registry.update(&found.id, definition).await?;
                if record.id != found.id {
                    tracing::warn!(
                        "⚠️ Update of {} returned a different id: {}",
                        found.id,
                        record.id
                    );
                }

                Ok(UpsertOutcome::Updated(record))
            }
            None => {
                tracing::info!("➕ Creating workflow '{}'", definition.name);
                let record = self.registry.create(definition).await?;

                Ok(UpsertOutcome::Created(record))
            }
        }
    }
}
