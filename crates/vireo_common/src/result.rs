//! Common result and error types for the Vireo engine.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// local recovery). `Err` indicates an unrecoverable internal error (a bug
/// in Vireo or corrupt engine state), not a user-facing condition. Design
/// problems are reported through the diagnostic sink and the operation
/// still returns `Ok`.
pub type VireoResult<T> = Result<T, InternalError>;

/// An internal engine error indicating a bug in Vireo, not a design problem.
///
/// These errors should never occur during normal operation. If one does
/// occur, it means the netlist or timing graph is corrupt or there is a
/// logic error in the engine.
#[derive(Debug, thiserror::Error)]
#[error("internal engine error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
