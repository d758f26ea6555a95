//! Classify transport statuses and application error codes for retry decisions.

use tonic::{Code, Status};

use crate::retry::error::CallError;

/// Application error code the registry returns while a terminal's execution
/// host is still being provisioned.
pub const TERMINAL_INSTANCE_NOT_FOUND: &str = "TERMINAL_INSTANCE_NOT_FOUND";
/// Registry variant of the same not-ready condition.
pub const TERMINAL_REGISTRY_TERMINAL_NOT_FOUND: &str = "TERMINAL_REGISTRY_TERMINAL_NOT_FOUND";

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Network/server-level failure that never reached application logic;
    /// retried silently.
    TransientTransport,
    /// The session exists logically but its execution host is not ready yet;
    /// retried silently on the same backoff path.
    RecoverableSession,
    /// Surfaced to the caller, never retried. Includes caller cancellation.
    Fatal,
}

/// Classify a transport status.
///
/// `Unavailable` and `DeadlineExceeded` are server/network conditions worth
/// waiting out. A `Cancelled` status from the remote side is fatal; the
/// caller's own cancellation never reaches this function (the executors
/// handle their token directly).
pub fn classify_status(status: &Status) -> Classification {
    match status.code() {
        Code::Unavailable | Code::DeadlineExceeded => Classification::TransientTransport,
        _ => Classification::Fatal,
    }
}

/// Classify an application error code from a response body.
pub fn classify_api_code(code: &str) -> Classification {
    match code {
        TERMINAL_INSTANCE_NOT_FOUND | TERMINAL_REGISTRY_TERMINAL_NOT_FOUND => {
            Classification::RecoverableSession
        }
        _ => Classification::Fatal,
    }
}

/// Classify a terminal-shaped error. Provided for callers that hold a
/// `CallError`; the executors classify at the source instead.
pub fn classify(err: &CallError) -> Classification {
    match err {
        CallError::Transport(status) => classify_status(status),
        CallError::Api(api) => classify_api_code(&api.code),
        CallError::Cancelled => Classification::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::error::ApiError;

    #[test]
    fn unavailable_and_deadline_are_transient() {
        assert_eq!(
            classify_status(&Status::unavailable("backend down")),
            Classification::TransientTransport
        );
        assert_eq!(
            classify_status(&Status::deadline_exceeded("slow")),
            Classification::TransientTransport
        );
    }

    #[test]
    fn other_statuses_fatal() {
        assert_eq!(
            classify_status(&Status::invalid_argument("bad request")),
            Classification::Fatal
        );
        assert_eq!(
            classify_status(&Status::cancelled("server cancelled")),
            Classification::Fatal
        );
        assert_eq!(
            classify_status(&Status::unauthenticated("no token")),
            Classification::Fatal
        );
    }

    #[test]
    fn provisioning_codes_recoverable() {
        assert_eq!(
            classify_api_code(TERMINAL_INSTANCE_NOT_FOUND),
            Classification::RecoverableSession
        );
        assert_eq!(
            classify_api_code(TERMINAL_REGISTRY_TERMINAL_NOT_FOUND),
            Classification::RecoverableSession
        );
    }

    #[test]
    fn unknown_api_codes_fatal() {
        assert_eq!(classify_api_code("INSUFFICIENT_MARGIN"), Classification::Fatal);
        assert_eq!(classify_api_code(""), Classification::Fatal);
    }

    #[test]
    fn cancellation_fatal() {
        assert_eq!(classify(&CallError::Cancelled), Classification::Fatal);
    }

    #[test]
    fn classify_is_idempotent() {
        let err = CallError::Api(ApiError::new(TERMINAL_INSTANCE_NOT_FOUND, "not ready"));
        let first = classify(&err);
        for _ in 0..10 {
            assert_eq!(classify(&err), first);
        }
    }
}
