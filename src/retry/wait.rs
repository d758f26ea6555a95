//! Pre-retry sleep that races the caller's cancellation.

use tokio_util::sync::CancellationToken;

use crate::retry::error::CallError;
use crate::retry::policy::BackoffPolicy;

/// Sleep for the backoff delay of `attempt`, or return `Cancelled` the
/// moment the caller's token fires. Cancellation always wins the race.
pub(crate) async fn backoff_wait(
    policy: &BackoffPolicy,
    attempt: u32,
    cancel: &CancellationToken,
) -> Result<(), CallError> {
    let delay = policy.delay(attempt);
    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");
    tokio::select! {
        _ = cancel.cancelled() => Err(CallError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
