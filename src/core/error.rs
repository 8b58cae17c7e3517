//! Engine error types and callback result aggregation.

use super::state::StateId;
use thiserror::Error;

/// Result returned by every state lifecycle callback.
pub type CallbackResult = Result<(), FsmError>;

/// Errors reported by the engine and by state callbacks.
///
/// The taxonomy is flat on purpose: callers match on [`ErrorKind`] to decide
/// whether to halt, log, or force a transition into a safe state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// A required argument was absent or malformed, or a state has no run callback.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No state in the table carries the requested id.
    #[error("No state with id {0}")]
    NotFound(StateId),

    /// Synchronization failure or an application-level callback failure.
    #[error("Operation failed: {0}")]
    Generic(String),
}

/// Discriminant of [`FsmError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Generic,
}

impl FsmError {
    /// Shorthand for a [`FsmError::Generic`] failure.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Generic(_) => ErrorKind::Generic,
        }
    }
}

/// Fold one more callback result into a tick's aggregate.
///
/// Success only survives if every result succeeded. Failures of the same kind
/// keep the first failure; failures of different kinds collapse to
/// [`FsmError::Generic`]. Nothing richer than "all succeeded / at least one
/// failed" is encoded.
pub(crate) fn combine(acc: CallbackResult, next: CallbackResult) -> CallbackResult {
    match (acc, next) {
        (Ok(()), next) => next,
        (Err(first), Ok(())) => Err(first),
        (Err(first), Err(second)) if first.kind() == second.kind() => Err(first),
        (Err(first), Err(second)) => Err(FsmError::Generic(format!(
            "multiple callbacks failed: {first}; {second}"
        ))),
    }
}
