/// Workflow Definition Layer
///
/// This module holds the data exchanged with the remote workflow service:
/// - Type definitions (WorkflowDefinition, Node, Connection, RemoteWorkflowRecord)
/// - Structural validation of desired definitions
/// - The deterministic Blockforge dispatcher builder

// Core workflow type definitions
pub mod types;

// Deterministic builder for the build dispatcher workflow
pub mod builder;

// Re-export commonly used types
pub use builder::DispatcherWorkflow;
pub use types::{
    Connection, ConnectionGraph, Node, RemoteWorkflowRecord, WorkflowDefinition, WorkflowId,
};
