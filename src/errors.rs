//! Error types for ticketflow
//!
//! Each error type has a corresponding error code for programmatic handling.

use thiserror::Error;

use crate::domain::Violation;

/// Result type alias for ticketflow operations
pub type Result<T> = std::result::Result<T, TicketflowError>;

/// Main error type for all ticketflow operations
#[derive(Debug, Error)]
pub enum TicketflowError {
    /// Structural validation failed; carries every violation found
    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// An id does not belong to the workflow being operated on
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A cloned transition points at a state missing from the remap table
    #[error("Incomplete remap: {0}")]
    IncompleteRemap(String),

    /// A ticket move is not allowed by the live workflow graph
    #[error("State transition error: {0}")]
    StateTransition(String),

    /// Workflow not found in the store
    #[error("Workflow not found: {0}")]
    NotFound(i64),

    /// The team already has the source workflow linked
    #[error("Workflow {workflow_id} is already linked to team {team_id}")]
    AlreadyLinked { workflow_id: i64, team_id: i64 },

    /// The workflow's graph is referenced by other workflows
    #[error("Workflow {0} is referenced by other workflows")]
    InUse(i64),

    /// No .ticketflow directory found
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    /// Invalid JSON format
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error with context
    #[error("{context}: {message}")]
    Wrapped { context: String, message: String },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl TicketflowError {
    /// Get the error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            TicketflowError::Validation(_) => "VALIDATION",
            TicketflowError::InvalidReference(_) => "INVALID_REFERENCE",
            TicketflowError::IncompleteRemap(_) => "INCOMPLETE_REMAP",
            TicketflowError::StateTransition(_) => "STATE_TRANSITION",
            TicketflowError::NotFound(_) => "NOT_FOUND",
            TicketflowError::AlreadyLinked { .. } => "ALREADY_LINKED",
            TicketflowError::InUse(_) => "IN_USE",
            TicketflowError::StoreNotFound(_) => "STORE_NOT_FOUND",
            TicketflowError::InvalidJson(_) => "INVALID_JSON",
            TicketflowError::FileNotFound(_) => "FILE_NOT_FOUND",
            TicketflowError::ConfigError(_) => "CONFIG_ERROR",
            TicketflowError::Io(_) => "IO_ERROR",
            TicketflowError::Wrapped { .. } => "WRAPPED_ERROR",
        }
    }

    /// Whether the caller can recover by correcting its input
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            TicketflowError::Validation(_) | TicketflowError::StateTransition(_)
        )
    }

    /// Wrap an error with additional context
    pub fn wrap<E: std::fmt::Display>(error: E, context: impl Into<String>) -> Self {
        TicketflowError::Wrapped {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

/// Convert an error to an appropriate exit code
pub fn to_exit_code(error: &TicketflowError) -> i32 {
    match error {
        TicketflowError::Validation(_) => 2,
        _ => 1,
    }
}
