/// Error taxonomy for workflow registration
///
/// Callers branch on the variant rather than on message text: configuration
/// problems are detected before any network activity, transport problems carry
/// the failed operation plus whatever the service answered.

use reqwest::StatusCode;
use std::fmt;

/// Remote operation that produced a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// GET /workflows
    List,
    /// POST /workflows
    Create,
    /// PATCH /workflows/{id}
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by configuration, the registry client and the orchestrator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration missing or malformed. Always raised before any request is sent.
    #[error("{0}")]
    Configuration(String),

    /// Non-2xx response, unreadable response or connection-level failure
    #[error("{operation} failed: {}", describe_transport(.status, .message))]
    Transport {
        operation: Operation,
        /// HTTP status, `None` when no response was received
        status: Option<u16>,
        /// Response body or connection error text
        message: String,
    },

    /// Workflow definition violates its own structural invariants
    #[error("invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// Payload could not be encoded as JSON
    #[error("failed to encode workflow payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn transport(operation: Operation, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Operation that failed, for transport errors only
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Transport { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// HTTP status of a transport error, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

/// Renders "Request failed (404 Not Found): body" or the bare connection error
fn describe_transport(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => {
            let reason = StatusCode::from_u16(*code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Unknown Status");
            format!("Request failed ({code} {reason}): {message}")
        }
        None => format!("Request failed: {message}"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
