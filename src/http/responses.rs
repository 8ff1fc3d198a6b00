use serde::{Deserialize, Serialize};

use crate::cache::ConnectionState;
use crate::instance::{InstanceSnapshot, MemoryReport, UptimeBreakdown};

/// GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub redis: ConnectionState,
    #[serde(flatten)]
    pub instance: InstanceSnapshot,
}

/// GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
    pub documentation: String,
    pub instance: InstanceSnapshot,
}

/// GET /api/counter and POST /api/counter/increment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterResponse {
    pub counter: u64,
    pub cached: bool,
    pub instance: InstanceSnapshot,
}

/// POST /api/counter/reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
    pub counter: u64,
    pub instance: InstanceSnapshot,
}

/// Cache section of the stats response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInfo {
    pub connected: bool,
    pub host: String,
    pub port: u16,
    pub key: String,
    pub ttl_seconds: u64,
}

/// GET /api/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub instance: InstanceSnapshot,
    pub uptime: UptimeBreakdown,
    pub redis: CacheInfo,
    pub memory: MemoryReport,
}

/// GET /api/load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResponse {
    pub message: String,
    pub duration: String,
    pub result: f64,
    pub rounds: u64,
    pub elapsed_ms: u64,
    pub instance: InstanceSnapshot,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadParams {
    pub duration: Option<String>,
}
