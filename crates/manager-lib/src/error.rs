//! Error taxonomy for control plane operations

use crate::runtime::RuntimeError;
use thiserror::Error;

/// Result alias used across the core components
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Terminal failure of a single control plane operation.
///
/// Nothing here is retried or recovered locally; every variant ends the
/// request that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// Unknown or unmanaged container, or an unrecognized lifecycle command
    #[error("Not found")]
    NotFound,

    /// Operation refused because of the container's current state
    #[error("{0}")]
    PreconditionFailed(String),

    /// The container runtime rejected or failed the call
    #[error("Error querying Docker daemon: {0}")]
    Internal(String),

    /// The metrics collector is unreachable or answered with a failure
    #[error("{0}")]
    CollaboratorUnavailable(String),

    /// The metrics collector answered with something we cannot interpret
    #[error("Invalid metrics payload: {0}")]
    InvalidPayload(String),
}

impl ManagerError {
    /// Short title suitable for an error response body
    pub fn title(&self) -> &'static str {
        match self {
            ManagerError::NotFound => "Not found",
            ManagerError::PreconditionFailed(_) => "Precondition failed",
            ManagerError::Internal(_) => "Error querying Docker daemon",
            ManagerError::CollaboratorUnavailable(_) => "Metrics collector unavailable",
            ManagerError::InvalidPayload(_) => "Invalid metrics payload",
        }
    }

    /// Optional description carried alongside the title
    pub fn details(&self) -> Option<&str> {
        match self {
            ManagerError::NotFound => None,
            ManagerError::PreconditionFailed(msg)
            | ManagerError::Internal(msg)
            | ManagerError::CollaboratorUnavailable(msg)
            | ManagerError::InvalidPayload(msg) => Some(msg),
        }
    }

    /// Whether the error was caused by a collaborator rather than the caller
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            ManagerError::Internal(_)
                | ManagerError::CollaboratorUnavailable(_)
                | ManagerError::InvalidPayload(_)
        )
    }
}

impl From<RuntimeError> for ManagerError {
    fn from(err: RuntimeError) -> Self {
        ManagerError::Internal(err.to_string())
    }
}
