use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::http::responses::{
    CacheInfo, CounterResponse, HealthResponse, LoadParams, LoadResponse, ResetResponse,
    StatsResponse, WelcomeResponse,
};
use crate::http::state::AppState;
use crate::instance::{MemoryReport, UptimeBreakdown};
use crate::load;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        redis: state.cache().state(),
        instance: state.reporter.snapshot(),
    })
}

/// GET /
pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the scalable counter service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documentation: "/api/docs".to_string(),
        instance: state.reporter.snapshot(),
    })
}

/// GET /api/counter
pub async fn get_counter(State(state): State<AppState>) -> Result<Json<CounterResponse>> {
    let read = state.counter.read().await?;

    Ok(Json(CounterResponse {
        counter: read.value,
        cached: read.cached,
        instance: state.reporter.snapshot(),
    }))
}

/// POST /api/counter/increment
pub async fn increment_counter(State(state): State<AppState>) -> Result<Json<CounterResponse>> {
    let value = state.counter.increment().await?;
    info!("[INCREMENT] counter is now {}", value);

    Ok(Json(CounterResponse {
        counter: value,
        cached: true,
        instance: state.reporter.snapshot(),
    }))
}

/// POST /api/counter/reset
pub async fn reset_counter(State(state): State<AppState>) -> Result<Json<ResetResponse>> {
    let value = state.counter.reset().await?;
    info!("[RESET] counter reset to {}", value);

    Ok(Json(ResetResponse {
        message: "Counter reset".to_string(),
        counter: value,
        instance: state.reporter.snapshot(),
    }))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let instance = state.reporter.snapshot();
    let cache_config = &state.config.cache;

    Ok(Json(StatsResponse {
        uptime: UptimeBreakdown::from_seconds(instance.uptime),
        redis: CacheInfo {
            connected: state.cache().is_connected(),
            host: cache_config.host.clone(),
            port: cache_config.port,
            key: state.counter.key().to_string(),
            ttl_seconds: state.counter.ttl().as_secs(),
        },
        memory: MemoryReport::from_usage(&instance.memory),
        instance,
    }))
}

/// GET /api/load?duration=<ms>
///
/// The request is held for the whole duration. The spin runs on the blocking
/// pool so other requests on this instance keep being served.
pub async fn synthetic_load(
    State(state): State<AppState>,
    params: std::result::Result<Query<LoadParams>, QueryRejection>,
) -> Result<Json<LoadResponse>> {
    // Malformed query strings get the same 500 `{error}` answer as bad values
    let Query(params) = params.map_err(|e| ServiceError::InvalidParameter(e.body_text()))?;
    let duration = load::parse_duration(params.duration.as_deref(), state.config.max_load_duration)
        .map_err(ServiceError::InvalidParameter)?;

    info!("[LOAD] burning CPU for {}ms", duration.as_millis());
    let report = tokio::task::spawn_blocking(move || load::burn_cpu(duration))
        .await
        .map_err(|e| ServiceError::Internal(format!("load task failed: {}", e)))?;

    Ok(Json(LoadResponse {
        message: "Heavy load simulation finished".to_string(),
        duration: format!("{}ms", report.requested.as_millis()),
        result: report.checksum,
        rounds: report.rounds,
        elapsed_ms: report.elapsed.as_millis() as u64,
        instance: state.reporter.snapshot(),
    }))
}
