// src/cache/redis.rs

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::cache::CacheBackend;
use crate::cache_op;
use crate::config::CacheConfig;
use crate::error::CacheError;

/// Redis-backed cache.
///
/// Holds a [`ConnectionManager`], which transparently reconnects after a
/// dropped connection; whether the service *uses* the connection is decided
/// by the [`CacheClient`](crate::cache::CacheClient) state flag, not here.
pub struct RedisBackend {
    client: Client,
    connection: Arc<Mutex<Option<ConnectionManager>>>,
    url: String,
    timeout: Duration,
}

// Manually implement Debug
impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Clone for RedisBackend {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            connection: Arc::clone(&self.connection),
            url: self.url.clone(),
            timeout: self.timeout,
        }
    }
}

impl RedisBackend {
    /// Creates a backend for the configured host and port.
    ///
    /// Opening the client only validates the URL; no connection is made until
    /// [`CacheBackend::connect`] is called.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = config.url();
        let client = Client::open(url.as_str())
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL {}: {}", url, e)))?;

        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            url,
            timeout: config.timeout,
        })
    }

    /// Address this backend points at
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Clone the live connection handle, or fail if none was established yet.
    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.connection
            .lock()
            .await
            .clone()
            .ok_or_else(|| CacheError::Connection(format!("not connected to {}", self.url)))
    }

    /// Run a command future under the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(format!(
                "Redis {} timed out after {:?}",
                operation, self.timeout
            ))),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn connect(&self) -> Result<(), CacheError> {
        // No internal retries on the first connect, so a refusal surfaces as
        // such instead of as a timeout. The monitor does the retrying.
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(self.timeout);
        let manager = self
            .bounded(
                "connect",
                ConnectionManager::new_with_config(self.client.clone(), config),
            )
            .await?;

        *self.connection.lock().await = Some(manager);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let reply: String = self.bounded("PING", conn.ping::<String>()).await?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Command(format!(
                "Unexpected response from Redis PING: {}",
                reply
            )))
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let start = Instant::now();
        let mut conn = self.connection().await?;
        let result: Result<Option<String>, CacheError> =
            self.bounded("GET", conn.get::<_, Option<String>>(key)).await;

        cache_op!("get", key, result, start.elapsed().as_millis() as u64);
        result
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let start = Instant::now();
        let mut conn = self.connection().await?;
        // SETEX only takes whole seconds and rejects zero
        let seconds = ttl.as_secs().max(1);
        let result: Result<(), CacheError> =
            self.bounded("SETEX", conn.set_ex::<_, _, ()>(key, value, seconds)).await;

        cache_op!("set", key, result, start.elapsed().as_millis() as u64);
        result
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let start = Instant::now();
        let mut conn = self.connection().await?;
        let result: Result<i64, CacheError> = self.bounded("DEL", conn.del::<_, i64>(key)).await;

        cache_op!("delete", key, result, start.elapsed().as_millis() as u64);
        result.map(|removed| removed > 0)
    }

    async fn close(&self) {
        // Dropping the last manager handle closes the socket
        self.connection.lock().await.take();
    }
}
