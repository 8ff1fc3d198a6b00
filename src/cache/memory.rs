// src/cache/memory.rs

// In-memory cache backend.
// Used when no Redis is available and by the tests. Clones share the same
// map, so several in-process service instances can share one "remote" cache.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::cache::CacheBackend;
use crate::error::CacheError;

/// Entry in the in-memory cache
#[derive(Debug)]
struct MemoryEntry {
    value: String,
    expiry: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

/// In-memory cache backend implementation
#[derive(Debug)]
pub struct MemoryBackend {
    data: Arc<RwLock<HashMap<String, MemoryEntry>>>,
    max_entries: usize,
    reachable: Arc<AtomicBool>,
    // Per handle, like a connection: closing one clone leaves the others usable
    closed: AtomicBool,
}

impl Clone for MemoryBackend {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            max_entries: self.max_entries,
            reachable: Arc::clone(&self.reachable),
            closed: AtomicBool::new(false),
        }
    }
}

impl MemoryBackend {
    /// Creates a new in-memory cache holding at most `max_entries` live keys
    pub fn new(max_entries: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::with_capacity(max_entries.min(1024)))),
            max_entries,
            reachable: Arc::new(AtomicBool::new(true)),
            closed: AtomicBool::new(false),
        }
    }

    /// Simulate the backend going away (or coming back).
    ///
    /// While unreachable, `connect` fails with a connection refusal and every
    /// command fails with a connection error, like a stopped Redis would.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let data = self.data.read().await;
        data.values().filter(|entry| !entry.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::Connection(
                "in-memory cache is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn connect(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionRefused(
                "in-memory cache refused the connection".to_string(),
            ));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;

        let now = Instant::now();
        {
            let data = self.data.read().await;
            match data.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Key is expired, take the write lock to remove it
        let mut data = self.data.write().await;
        if data.get(key).is_some_and(|entry| entry.is_expired(now)) {
            data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;

        let now = Instant::now();
        let mut data = self.data.write().await;

        // Apply max entries limit
        if data.len() >= self.max_entries && !data.contains_key(key) {
            data.retain(|_, entry| !entry.is_expired(now));
            if data.len() >= self.max_entries {
                return Err(CacheError::Command(
                    "Maximum entries limit exceeded".to_string(),
                ));
            }
        }

        data.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expiry: now + ttl,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check_available()?;

        let now = Instant::now();
        let mut data = self.data.write().await;
        Ok(data
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
