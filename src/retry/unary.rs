//! Retry loop for unary (request/response) calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::Status;

use crate::retry::classify::{classify_api_code, classify_status, Classification};
use crate::retry::error::{ApiError, CallError};
use crate::retry::policy::BackoffPolicy;
use crate::retry::wait::backoff_wait;
use crate::session::SessionState;

/// Run one unary call until success, a fatal classification, or caller
/// cancellation.
///
/// `call` is invoked with fresh session headers on every attempt and must
/// perform exactly one transport call. `extract_err` pulls the embedded
/// application error out of an otherwise successful response; `None` means
/// the response is good. One generic loop serves every response type, so
/// call sites never duplicate retry logic.
///
/// Transient transport failures and recoverable session errors are retried
/// silently with capped, jittered backoff. The attempt count is unbounded:
/// the caller's `cancel` token is the sole termination guarantee, so unary
/// callers must supply a bounded one. A session that is permanently gone
/// therefore retries until that token fires; the executor never issues an
/// explicit reconnect on the caller's behalf.
pub async fn run_unary<T, F, Fut, E>(
    session: &SessionState,
    policy: &BackoffPolicy,
    cancel: &CancellationToken,
    mut call: F,
    extract_err: E,
) -> Result<T, CallError>
where
    F: FnMut(MetadataMap) -> Fut,
    Fut: Future<Output = Result<T, Status>>,
    E: Fn(&T) -> Option<ApiError>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        let headers = session.headers();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(CallError::Cancelled),
            outcome = call(headers) => outcome,
        };
        match outcome {
            Ok(response) => match extract_err(&response) {
                None => return Ok(response),
                Some(api) => match classify_api_code(&api.code) {
                    Classification::RecoverableSession => {
                        tracing::debug!(code = %api.code, attempt, "session not ready, retrying");
                        backoff_wait(policy, attempt, cancel).await?;
                        attempt += 1;
                    }
                    _ => return Err(CallError::Api(api)),
                },
            },
            Err(status) => match classify_status(&status) {
                Classification::TransientTransport => {
                    tracing::debug!(code = ?status.code(), attempt, "transient transport failure, retrying");
                    backoff_wait(policy, attempt, cancel).await?;
                    attempt += 1;
                }
                _ => return Err(CallError::Transport(status)),
            },
        }
    }
}
