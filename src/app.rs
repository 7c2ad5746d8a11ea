/// Application wiring
///
/// Builds the desired workflow, the HTTP registry client and the orchestrator from a
/// validated configuration and runs a single upsert.

use crate::{
    config::Config,
    error::Result,
    registry::HttpRegistryClient,
    upsert::{UpsertOrchestrator, UpsertOutcome},
    workflow::DispatcherWorkflow,
};

/// Register the dispatcher workflow described by `config`.
///
/// Performs exactly two requests on success: one list, then one create or update.
pub async fn register_workflow(config: &Config) -> Result<UpsertOutcome> {
    let definition = DispatcherWorkflow::from_config(&config.workflow).build();
    tracing::debug!(
        "🏗️ Built workflow '{}' with {} nodes and {} connections",
        definition.name,
        definition.nodes.len(),
        definition.connections.edge_count()
    );

    tracing::info!("📡 Using n8n API at {}", config.registry.base_url);
    let client = HttpRegistryClient::new(&config.registry)?;

    let outcome = UpsertOrchestrator::new(client).upsert(&definition).await?;
    tracing::info!("✅ {}", outcome);

    Ok(outcome)
}
