//! termlink: resilient client runtime for remote trading-terminal control
//! services.
//!
//! The crate is a pure in-process execution primitive: call sites supply a
//! transport invoker, an application-error extractor and (for streams) a
//! data extractor plus a cancellation token, and get back a value/error or
//! a pair of channels. Session churn, transport failures and stream
//! disconnects are absorbed inside [`retry`]; callers observe only ultimate
//! success or a single fatal error.

pub mod config;
pub mod logging;
pub mod retry;
pub mod session;
