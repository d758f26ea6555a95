//! Resilient RPC execution: retry, reconnect and backoff.
//!
//! This module encapsulates error classification (transport statuses,
//! application error codes), exponential backoff decisions and the two
//! generic executors so that higher layers (account queries, trading
//! operations, event subscriptions) can share a consistent policy without
//! understanding the reconnection protocol.

mod classify;
mod error;
mod policy;
mod stream;
mod unary;
mod wait;

pub use classify::{
    classify, classify_api_code, classify_status, Classification, TERMINAL_INSTANCE_NOT_FOUND,
    TERMINAL_REGISTRY_TERMINAL_NOT_FOUND,
};
pub use error::{ApiError, CallError};
pub use policy::BackoffPolicy;
pub use stream::{run_stream, StreamSubscription};
pub use unary::run_unary;
