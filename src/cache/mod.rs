// src/cache/mod.rs
//! Shared remote cache used as the cache-aside layer in front of the counter.
//!
//! The [`CacheClient`] is the only type the rest of the service talks to. It
//! owns a [`CacheBackend`] and a [`ConnectionState`] flag, and every operation
//! consults that flag before touching the backend:
//!
//! - while **Disconnected**, `get` behaves like a miss and `set`/`delete`
//!   succeed without doing anything, so cache outages never fail a request;
//! - while **Connected**, read errors are swallowed (treated as a miss) but
//!   write errors are returned to the caller.

pub mod client;
pub mod memory;
pub mod monitor;
pub mod redis;

#[cfg(test)]
mod tests;

pub use self::client::{CacheClient, ConnectionState};
pub use self::memory::MemoryBackend;
pub use self::monitor::{ConnectionMonitor, MonitorConfig};
pub use self::redis::RedisBackend;

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::CacheError;

/// Core trait that all cache backends must implement
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    // Establishes (or re-establishes) the connection to the backend
    async fn connect(&self) -> Result<(), CacheError>;

    // Round-trips a PING to verify the connection is alive
    async fn ping(&self) -> Result<(), CacheError>;

    // Retrieves a value by key
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    // Stores a value under a key with an expiry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    // Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    // Releases the connection; later calls fail with CacheError::Closed
    async fn close(&self);
}
