//! Streaming executor: opens a server-stream, relays messages through
//! channels, and transparently reopens the stream on recoverable failures.
//!
//! One background task per subscription drives an
//! Opening -> Receiving -> Reconnecting -> Closed state machine. Underlying
//! transport streams are opened strictly sequentially; an abandoned stream
//! is dropped, never replayed, because the server feed represents current
//! state rather than a durable log.

use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::Status;

use crate::retry::classify::{classify_api_code, classify_status, Classification};
use crate::retry::error::{ApiError, CallError};
use crate::retry::policy::BackoffPolicy;
use crate::retry::wait::backoff_wait;
use crate::session::SessionState;

/// A logical, long-lived event feed backed by 0..N sequential transport
/// streams.
///
/// Both channels close together, exactly once, when the subscription ends.
/// The error channel carries at most one terminal error; a clean
/// end-of-stream closes both channels with nothing emitted. The
/// subscription owns its cancellation token: dropping it cancels the token,
/// so the background task never outlives its consumer.
pub struct StreamSubscription<T> {
    /// Extracted messages, in per-stream order. Capacity 1: a slow consumer
    /// throttles the receive loop instead of dropping messages.
    pub data: mpsc::Receiver<T>,
    /// The single terminal error, if the subscription ended on one.
    pub errors: mpsc::Receiver<CallError>,
    cancel: CancellationToken,
}

impl<T> StreamSubscription<T> {
    /// Cancel the subscription. The background task observes the token at
    /// its next suspension point and closes both channels.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for StreamSubscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Open a resilient server-stream subscription.
///
/// `open` is called with the request and fresh session headers for every
/// underlying stream. `extract_err` pulls an embedded application error out
/// of a received message; `extract_data` converts a clean message into the
/// caller's payload (`None` means a housekeeping frame to skip, e.g. a
/// keepalive). The receive loop runs on a spawned task owned by the
/// returned subscription's channels.
///
/// The subscription takes ownership of `cancel`: it is cancelled by
/// [`StreamSubscription::cancel`] and when the subscription is dropped.
/// Callers that share one token across subscriptions should pass a
/// `child_token()`.
pub fn run_stream<Req, T, Raw, St, F, Fut, E, D>(
    session: Arc<SessionState>,
    policy: BackoffPolicy,
    cancel: CancellationToken,
    request: Req,
    open: F,
    extract_err: E,
    extract_data: D,
) -> StreamSubscription<T>
where
    Req: Clone + Send + 'static,
    Raw: Send + 'static,
    T: Send + 'static,
    St: Stream<Item = Result<Raw, Status>> + Unpin + Send + 'static,
    F: FnMut(Req, MetadataMap) -> Fut + Send + 'static,
    Fut: Future<Output = Result<St, Status>> + Send,
    E: Fn(&Raw) -> Option<ApiError> + Send + 'static,
    D: Fn(Raw) -> Option<T> + Send + 'static,
{
    let (data_tx, data_rx) = mpsc::channel(1);
    let (err_tx, err_rx) = mpsc::channel(1);
    let task_cancel = cancel.clone();
    tokio::spawn(async move {
        let terminal = subscription_loop(
            session,
            policy,
            &task_cancel,
            request,
            open,
            extract_err,
            extract_data,
            &data_tx,
        )
        .await;
        if let Some(err) = terminal {
            let _ = err_tx.try_send(err);
        }
        // data_tx and err_tx drop here: both channels close together.
    });
    StreamSubscription {
        data: data_rx,
        errors: err_rx,
        cancel,
    }
}

/// Drive one subscription to its terminal state. Returns the error to emit,
/// or `None` for a clean close.
#[allow(clippy::too_many_arguments)]
async fn subscription_loop<Req, T, Raw, St, F, Fut, E, D>(
    session: Arc<SessionState>,
    policy: BackoffPolicy,
    cancel: &CancellationToken,
    request: Req,
    mut open: F,
    extract_err: E,
    extract_data: D,
    data_tx: &mpsc::Sender<T>,
) -> Option<CallError>
where
    Req: Clone,
    St: Stream<Item = Result<Raw, Status>> + Unpin,
    F: FnMut(Req, MetadataMap) -> Fut,
    Fut: Future<Output = Result<St, Status>>,
    E: Fn(&Raw) -> Option<ApiError>,
    D: Fn(Raw) -> Option<T>,
{
    let mut attempt = 0u32;
    loop {
        // Opening
        let headers = session.headers();
        let opened = tokio::select! {
            _ = cancel.cancelled() => return Some(CallError::Cancelled),
            opened = open(request.clone(), headers) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(status) => match classify_status(&status) {
                Classification::TransientTransport => {
                    tracing::debug!(code = ?status.code(), attempt, "stream open failed, retrying");
                    if let Err(err) = backoff_wait(&policy, attempt, cancel).await {
                        return Some(err);
                    }
                    attempt += 1;
                    continue;
                }
                _ => return Some(CallError::Transport(status)),
            },
        };
        // Receiving
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Some(CallError::Cancelled),
                item = stream.next() => item,
            };
            match item {
                // Clean end-of-stream: close without an error.
                None => return None,
                Some(Ok(raw)) => {
                    if let Some(api) = extract_err(&raw) {
                        match classify_api_code(&api.code) {
                            Classification::RecoverableSession => {
                                tracing::debug!(code = %api.code, attempt, "session not ready, reopening stream");
                                if let Err(err) = backoff_wait(&policy, attempt, cancel).await {
                                    return Some(err);
                                }
                                attempt += 1;
                                // Reconnecting: drop this stream, reopen.
                                break;
                            }
                            _ => return Some(CallError::Api(api)),
                        }
                    } else {
                        // A healthy message restores full backoff headroom
                        // for the next disconnect.
                        attempt = 0;
                        if let Some(msg) = extract_data(raw) {
                            let sent = tokio::select! {
                                _ = cancel.cancelled() => return Some(CallError::Cancelled),
                                sent = data_tx.send(msg) => sent,
                            };
                            if sent.is_err() {
                                // Consumer dropped the subscription.
                                return None;
                            }
                        }
                    }
                }
                Some(Err(status)) => match classify_status(&status) {
                    Classification::TransientTransport => {
                        tracing::debug!(code = ?status.code(), attempt, "stream lost, reopening");
                        if let Err(err) = backoff_wait(&policy, attempt, cancel).await {
                            return Some(err);
                        }
                        attempt += 1;
                        break;
                    }
                    _ => return Some(CallError::Transport(status)),
                },
            }
        }
    }
}
