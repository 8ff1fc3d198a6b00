// src/test_utils.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::{CacheBackend, CacheClient, MemoryBackend};
use crate::config::ServiceConfig;
use crate::error::CacheError;
use crate::http::AppState;

/// Mock cache backend whose individual commands can be made to fail
#[derive(Debug, Default)]
pub struct MockBackend {
    data: Mutex<HashMap<String, (String, Instant)>>,
    pub fail_connect: AtomicBool,
    pub refuse_connect: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_ping: AtomicBool,
    pub connects: AtomicUsize,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value currently stored, ignoring expiry
    pub fn stored(&self, key: &str) -> Option<String> {
        let data = self.data.lock().unwrap();
        data.get(key).map(|(value, _)| value.clone())
    }

    /// TTL the last write for `key` was given, measured from now
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let data = self.data.lock().unwrap();
        data.get(key)
            .map(|(_, expiry)| expiry.saturating_duration_since(Instant::now()))
    }

    fn fail(flag: &AtomicBool, what: &str) -> Result<(), CacheError> {
        if flag.load(Ordering::SeqCst) {
            Err(CacheError::Command(format!("Mock {} failure", what)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for MockBackend {
    async fn connect(&self) -> Result<(), CacheError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionRefused(
                "Connection refused (os error 111)".to_string(),
            ));
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(CacheError::Auth("Mock authentication failure".to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("Mock connection reset".to_string()));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.fail_get, "GET")?;

        let data = self.data.lock().unwrap();
        Ok(data
            .get(key)
            .filter(|(_, expiry)| *expiry > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.fail_set, "SET")?;

        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.fail_delete, "DEL")?;

        let mut data = self.data.lock().unwrap();
        Ok(data.remove(key).is_some())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connected client over a fresh mock backend
pub async fn connected_mock_client() -> (Arc<MockBackend>, Arc<CacheClient>) {
    let backend = Arc::new(MockBackend::new());
    let client = Arc::new(CacheClient::new(backend.clone()));
    client.connect().await.unwrap();
    (backend, client)
}

/// Connected client over a handle to `backend`; clones share the same data
pub async fn connected_memory_client(backend: &MemoryBackend) -> Arc<CacheClient> {
    let client = Arc::new(CacheClient::new(Arc::new(backend.clone())));
    client.connect().await.unwrap();
    client
}

/// Configuration for an in-process test instance
pub fn test_config(port: u16, ttl: Duration) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.port = port;
    config.cache.counter_ttl = ttl;
    config.max_load_duration = Duration::from_secs(2);
    config
}

/// One service instance sharing `backend` with any other instance built from it
pub async fn instance_on(backend: &MemoryBackend, port: u16, ttl: Duration) -> AppState {
    let client = connected_memory_client(backend).await;
    AppState::new(test_config(port, ttl), client)
}
