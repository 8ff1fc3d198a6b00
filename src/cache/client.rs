// src/cache/client.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cache::CacheBackend;
use crate::error::CacheError;

/// Whether the client currently believes the backend is usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
        }
    }

    fn from_u8(raw: u8) -> Self {
        if raw == ConnectionState::Connected as u8 {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide handle to the shared cache.
///
/// Created once at startup and shared behind an `Arc`. The connection state
/// starts out `Disconnected` and is flipped by [`connect`](Self::connect),
/// [`refresh`](Self::refresh) and by any backend error observed along the way.
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    state: AtomicU8,
    closed: AtomicBool,
}

impl fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("backend", &self.backend)
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CacheClient {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            closed: AtomicBool::new(false),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Store a new state, logging only actual transitions
    fn set_state(&self, next: ConnectionState) {
        let previous = ConnectionState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        if previous != next {
            match next {
                ConnectionState::Connected => info!("Cache backend is now connected"),
                ConnectionState::Disconnected => warn!("Cache backend is now disconnected"),
            }
        }
    }

    /// Force the Disconnected state; cache calls become no-ops until the next
    /// successful [`connect`](Self::connect).
    pub fn mark_disconnected(&self) {
        self.set_state(ConnectionState::Disconnected);
    }

    /// Record a backend failure: log it with its class and drop to Disconnected
    fn record_failure(&self, operation: &str, err: &CacheError) {
        if err.is_connection_refused() {
            error!(operation, error = %err, "Cache backend connection refused");
        } else {
            error!(operation, error = %err, "Cache backend error");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Establish the backend connection.
    pub async fn connect(&self) -> Result<(), CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }

        match self.backend.connect().await {
            Ok(()) => {
                // close() may have raced with the handshake
                if self.is_closed() {
                    self.backend.close().await;
                    return Err(CacheError::Closed);
                }
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(err) => {
                self.record_failure("connect", &err);
                Err(err)
            }
        }
    }

    /// One health step: reconnect when down, ping when up.
    pub async fn refresh(&self) -> ConnectionState {
        if self.is_closed() {
            return ConnectionState::Disconnected;
        }

        match self.state() {
            ConnectionState::Disconnected => {
                if let Err(err) = self.connect().await {
                    debug!(error = %err, "Cache reconnect attempt failed");
                }
            }
            ConnectionState::Connected => {
                if let Err(err) = self.backend.ping().await {
                    self.record_failure("ping", &err);
                }
            }
        }

        self.state()
    }

    /// Read a key. Disconnected, missing and failed reads all come back as `None`.
    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_connected() {
            return None;
        }

        match self.backend.get(key).await {
            Ok(value) => value,
            Err(err) => {
                self.record_failure("get", &err);
                None
            }
        }
    }

    /// Write a key with a TTL. A no-op while disconnected; backend errors propagate.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.backend.set(key, value, ttl).await.map_err(|err| {
            self.record_failure("set", &err);
            err
        })
    }

    /// Remove a key. A no-op while disconnected; backend errors propagate.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.backend.delete(key).await.map(|_| ()).map_err(|err| {
            self.record_failure("delete", &err);
            err
        })
    }

    /// Shut the client down. Only the first call reaches the backend.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.set_state(ConnectionState::Disconnected);
        self.backend.close().await;
        info!("Cache client closed");
    }
}
