// src/service.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::CacheClient;
use crate::counter::CounterStore;
use crate::counter_event;
use crate::error::Result;

/// Result of a counter read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRead {
    pub value: u64,
    /// True when the value came from the shared cache rather than this instance
    pub cached: bool,
}

/// Cache-aside protocol around the local counter.
///
/// Reads try the shared cache first and fall back to the local store,
/// repopulating the cache on the way out. Writes mutate the local store,
/// invalidate the cached copy and write the new value back.
///
/// A cache hit may carry a value written by a *different* instance; nothing
/// here tries to reconcile that.
#[derive(Debug)]
pub struct CounterService {
    store: CounterStore,
    cache: Arc<CacheClient>,
    key: String,
    ttl: Duration,
    // Orders this instance's cache writes with its local mutations
    write_gate: Mutex<()>,
}

impl CounterService {
    pub fn new(cache: Arc<CacheClient>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store: CounterStore::new(),
            cache,
            key: key.into(),
            ttl,
            write_gate: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<CacheClient> {
        &self.cache
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The local value, bypassing the cache
    pub fn local_value(&self) -> u64 {
        self.store.read()
    }

    pub async fn read(&self) -> Result<CounterRead> {
        if let Some(raw) = self.cache.get(&self.key).await {
            match raw.trim().parse::<u64>() {
                Ok(value) => {
                    info!(key = %self.key, "[CACHE HIT] counter served from cache");
                    counter_event!("read", value, true);
                    return Ok(CounterRead {
                        value,
                        cached: true,
                    });
                }
                Err(_) => warn!(key = %self.key, raw = %raw, "Ignoring unparsable cached counter"),
            }
        }

        info!(key = %self.key, "[CACHE MISS] counter served from local store");
        let value = {
            let _gate = self.write_gate.lock().await;
            let value = self.store.read();
            self.cache
                .set(&self.key, &value.to_string(), self.ttl)
                .await?;
            value
        };

        counter_event!("read", value, false);
        Ok(CounterRead {
            value,
            cached: false,
        })
    }

    pub async fn increment(&self) -> Result<u64> {
        let _gate = self.write_gate.lock().await;
        let value = self.store.increment();
        self.publish(value).await?;

        counter_event!("increment", value, true);
        Ok(value)
    }

    pub async fn reset(&self) -> Result<u64> {
        let _gate = self.write_gate.lock().await;
        let value = self.store.reset();
        self.publish(value).await?;

        counter_event!("reset", value, true);
        Ok(value)
    }

    /// Invalidate the cached copy, then write `value` back with the short TTL.
    /// The local store already holds `value`, so a failure here is not rolled back.
    async fn publish(&self, value: u64) -> Result<()> {
        self.cache.delete(&self.key).await?;
        info!(key = %self.key, "[INVALIDATE] cached counter removed");

        self.cache
            .set(&self.key, &value.to_string(), self.ttl)
            .await?;
        Ok(())
    }
}
