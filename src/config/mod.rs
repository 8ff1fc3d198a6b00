// src/config/mod.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ServiceError};

/// Top-level configuration of one service instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port the HTTP listener binds to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Upper bound accepted by the synthetic load endpoint
    #[serde(default = "default_max_load_duration", with = "duration_serde")]
    pub max_load_duration: Duration,

    /// Shared cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_load_duration() -> Duration {
    Duration::from_secs(30)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            max_load_duration: default_max_load_duration(),
            cache: CacheConfig::default(),
        }
    }
}

/// Which cache implementation backs the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackendKind::Redis),
            "memory" => Ok(CacheBackendKind::Memory),
            other => Err(ServiceError::Config(format!(
                "unknown cache backend '{}', expected 'redis' or 'memory'",
                other
            ))),
        }
    }
}

/// Configuration for the shared cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_backend")]
    pub backend: CacheBackendKind,

    /// Redis host
    #[serde(default = "default_host")]
    pub host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Key the counter is cached under
    #[serde(default = "default_counter_key")]
    pub counter_key: String,

    /// TTL for every counter write
    #[serde(default = "default_counter_ttl", with = "duration_serde")]
    pub counter_ttl: Duration,

    /// Timeout applied to connects and individual commands
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// How often the connection monitor checks the backend
    #[serde(default = "default_health_interval", with = "duration_serde")]
    pub health_check_interval: Duration,

    /// Entry cap for the in-memory backend
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_backend() -> CacheBackendKind {
    CacheBackendKind::Redis
}

fn default_host() -> String {
    "redis".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_counter_key() -> String {
    "counter:main".to_string()
}

fn default_counter_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_health_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            host: default_host(),
            port: default_redis_port(),
            counter_key: default_counter_key(),
            counter_ttl: default_counter_ttl(),
            timeout: default_timeout(),
            health_check_interval: default_health_interval(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Redis connection URL derived from host and port
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup; unset variables
    /// fall back to defaults, malformed ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CacheConfig::default();

        let cache = CacheConfig {
            backend: match lookup("CACHE_BACKEND") {
                Some(value) => value.parse()?,
                None => defaults.backend,
            },
            host: lookup("REDIS_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "REDIS_PORT")?.unwrap_or(defaults.port),
            counter_key: lookup("COUNTER_KEY").unwrap_or(defaults.counter_key),
            counter_ttl: parse_var(&lookup, "COUNTER_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.counter_ttl),
            timeout: parse_var(&lookup, "CACHE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            health_check_interval: parse_var(&lookup, "CACHE_HEALTH_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.health_check_interval),
            max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")?
                .unwrap_or(defaults.max_entries),
        };

        if cache.counter_ttl.is_zero() {
            return Err(ServiceError::Config(
                "COUNTER_TTL_SECS must be greater than zero".to_string(),
            ));
        }
        if cache.health_check_interval.is_zero() {
            return Err(ServiceError::Config(
                "CACHE_HEALTH_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            port: parse_var(&lookup, "PORT")?.unwrap_or_else(default_port),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(default_bind_address),
            max_load_duration: parse_var(&lookup, "LOAD_MAX_DURATION_MS")?
                .map(Duration::from_millis)
                .unwrap_or_else(default_max_load_duration),
            cache,
        })
    }

    /// Socket address string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            ServiceError::Config(format!("invalid value '{}' for {}: {}", raw, name, e))
        }),
    }
}

// Helper module to serialize/deserialize Duration with serde
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
