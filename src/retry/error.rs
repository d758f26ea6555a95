//! Error surface of the execution core.
//!
//! Callers observe exactly one of these per invocation; every retryable
//! failure is absorbed inside the executors and never reaches this type.

use thiserror::Error;

/// Application-level error carried inside an otherwise successful response.
///
/// The control service reports failures of the operation itself (as opposed
/// to transport failures) as a code/message pair embedded in the response
/// body; callers supply an extractor that pulls it out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Stable machine-readable error code, e.g. `TERMINAL_INSTANCE_NOT_FOUND`.
    pub code: String,
    /// Human-readable detail from the server.
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Terminal outcome of a unary call or streaming subscription.
#[derive(Debug, Error)]
pub enum CallError {
    /// Transport-level failure that was classified as fatal.
    #[error("transport: {0}")]
    Transport(#[from] tonic::Status),
    /// Application error reported by the service and classified as fatal.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The caller's cancellation token fired.
    #[error("call cancelled by caller")]
    Cancelled,
}

impl CallError {
    /// True when the error is the caller's own cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CallError::Cancelled)
    }
}
