// src/cache/tests/monitor_tests.rs

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::cache::{CacheClient, ConnectionMonitor, ConnectionState, MonitorConfig};
use crate::test_utils::MockBackend;

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        check_interval: Duration::from_millis(20),
        check_timeout: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn test_monitor_performs_initial_connect() {
    let backend = Arc::new(MockBackend::new());
    let client = Arc::new(CacheClient::new(backend.clone()));
    let monitor = ConnectionMonitor::new(Arc::clone(&client), fast_config());

    let handle = monitor.start();
    time::sleep(Duration::from_millis(60)).await;

    assert_eq!(client.state(), ConnectionState::Connected);

    monitor.stop();
    time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor should stop after the next tick")
        .unwrap();
}

#[tokio::test]
async fn test_monitor_tracks_outage_and_recovery() {
    let backend = Arc::new(MockBackend::new());
    let client = Arc::new(CacheClient::new(backend.clone()));
    let monitor = ConnectionMonitor::new(Arc::clone(&client), fast_config());
    let handle = monitor.start();

    time::sleep(Duration::from_millis(60)).await;
    assert!(client.is_connected());

    // Backend goes away: pings fail and reconnects are refused
    backend.fail_ping.store(true, Ordering::SeqCst);
    backend.refuse_connect.store(true, Ordering::SeqCst);
    time::sleep(Duration::from_millis(80)).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Backend comes back
    backend.fail_ping.store(false, Ordering::SeqCst);
    backend.refuse_connect.store(false, Ordering::SeqCst);
    time::sleep(Duration::from_millis(80)).await;
    assert_eq!(client.state(), ConnectionState::Connected);

    monitor.stop();
    handle.abort();
}

#[tokio::test]
async fn test_monitor_exits_when_client_closes() {
    let backend = Arc::new(MockBackend::new());
    let client = Arc::new(CacheClient::new(backend.clone()));
    let monitor = ConnectionMonitor::new(Arc::clone(&client), fast_config());
    let handle = monitor.start();

    client.close().await;

    time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor should exit once the client is closed")
        .unwrap();
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
}
