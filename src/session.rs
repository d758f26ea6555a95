//! Session state: the current server-side session token and connectivity
//! flag, read by the executors to build per-call metadata.
//!
//! Establishing and clearing the session belongs to the connection-lifecycle
//! collaborator (it calls `attach`/`clear`); the executors only read. A
//! fatal error while no session is attached is surfaced to the caller, never
//! auto-reconnected here.

use std::sync::RwLock;

use tonic::metadata::{MetadataMap, MetadataValue};

/// Metadata key the control service expects the session token under.
pub const SESSION_ID_KEY: &str = "session-id";

#[derive(Debug, Default)]
struct Inner {
    session_id: String,
    connected: bool,
}

/// Shared session state. Executors read it on every attempt; writers live
/// outside the execution core.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a freshly established session. Called by the connection
    /// lifecycle after a successful connect.
    pub fn attach(&self, session_id: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.session_id = session_id.into();
        inner.connected = true;
    }

    /// Clear the session on explicit disconnect.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.session_id.clear();
        inner.connected = false;
    }

    /// Whether a live session is attached.
    pub fn connected(&self) -> bool {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).connected
    }

    /// Per-call metadata: carries the session token only while connected,
    /// otherwise an empty map.
    pub fn headers(&self) -> MetadataMap {
        let mut map = MetadataMap::new();
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if inner.connected && !inner.session_id.is_empty() {
            match MetadataValue::try_from(inner.session_id.as_str()) {
                Ok(value) => {
                    map.insert(SESSION_ID_KEY, value);
                }
                Err(_) => {
                    tracing::warn!("session token is not valid ascii metadata, sending no token");
                }
            }
        }
        map
    }
}
