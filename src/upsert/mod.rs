/// Upsert Layer
///
/// Decides between create and update for a desired workflow:
/// - Pure name lookup over listed records
/// - Orchestrator issuing one list followed by one write

// Name-keyed lookup, independent of transport
pub mod lookup;

// Create-or-update orchestration
pub mod engine;

pub use engine::{UpsertOrchestrator, UpsertOutcome};
pub use lookup::find_by_name;
