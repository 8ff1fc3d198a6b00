// src/lifecycle.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cache::{
    CacheBackend, CacheClient, ConnectionMonitor, MemoryBackend, MonitorConfig, RedisBackend,
};
use crate::config::{CacheBackendKind, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::http::{build_router, AppState};

/// Build the cache client for the configured backend. Nothing is connected yet.
pub fn build_cache_client(config: &ServiceConfig) -> Result<Arc<CacheClient>> {
    let backend: Arc<dyn CacheBackend> = match config.cache.backend {
        CacheBackendKind::Redis => Arc::new(RedisBackend::new(&config.cache)?),
        CacheBackendKind::Memory => {
            warn!("Using the in-memory cache; it is not shared with other processes");
            Arc::new(MemoryBackend::new(config.cache.max_entries))
        }
    };

    Ok(Arc::new(CacheClient::new(backend)))
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(config: ServiceConfig) -> Result<()> {
    let cache = build_cache_client(&config)?;

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::Internal(format!("failed to bind {}: {}", address, e)))?;

    serve(listener, config, cache, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then shut
/// down in order: stop accepting, drain in-flight requests, stop the
/// monitor, close the cache.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServiceConfig,
    cache: Arc<CacheClient>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let monitor = ConnectionMonitor::new(
        Arc::clone(&cache),
        MonitorConfig {
            check_interval: config.cache.health_check_interval,
            // A reconnect may take the whole connect timeout
            check_timeout: config.cache.timeout + Duration::from_millis(500),
        },
    );
    let monitor_handle = monitor.start();

    let address = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| config.listen_address());

    let state = AppState::new(config, Arc::clone(&cache));
    log_banner(&state, &address);

    let router = build_router(state);
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::Internal(format!("server error: {}", e)));

    monitor.stop();
    monitor_handle.abort();
    cache.close().await;
    info!("Shutdown complete");

    served
}

fn log_banner(state: &AppState, address: &str) {
    info!(
        instance_id = %state.reporter.instance_id(),
        hostname = %state.reporter.hostname(),
        pid = std::process::id(),
        "Counter service listening on http://{}",
        address
    );
    info!(
        cache = %state.config.cache.url(),
        key = %state.config.cache.counter_key,
        ttl_secs = state.config.cache.counter_ttl.as_secs(),
        "Cache-aside settings"
    );
    info!("Endpoints: GET /health, GET /, GET /api/counter, POST /api/counter/increment, POST /api/counter/reset, GET /api/stats, GET /api/load");
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("SIGINT received, shutting down gracefully");
        },
        _ = terminate => {
            info!("SIGTERM received, shutting down gracefully");
        },
    }
}
