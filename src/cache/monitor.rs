// src/cache/monitor.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error};

use crate::cache::{CacheClient, ConnectionState};

/// Configuration for the connection monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often to check the backend
    pub check_interval: Duration,
    /// Timeout for a single check
    pub check_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            check_timeout: Duration::from_secs(1),
        }
    }
}

/// Background task that keeps the client's connection state current.
///
/// The first tick fires immediately, so starting the monitor is also what
/// performs the initial connect.
#[derive(Debug)]
pub struct ConnectionMonitor {
    client: Arc<CacheClient>,
    config: MonitorConfig,
    cancel_flag: Arc<AtomicBool>,
}

impl ConnectionMonitor {
    pub fn new(client: Arc<CacheClient>, config: MonitorConfig) -> Self {
        Self {
            client,
            config,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the monitor background task
    pub fn start(&self) -> task::JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let interval = self.config.check_interval;
        let timeout = self.config.check_timeout;
        let cancel_flag = Arc::clone(&self.cancel_flag);

        task::spawn(async move {
            let mut interval_timer = time::interval(interval);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;

                if cancel_flag.load(Ordering::SeqCst) || client.is_closed() {
                    break;
                }

                if time::timeout(timeout, client.refresh()).await.is_err() {
                    error!("Cache health check timed out after {:?}", timeout);
                    if client.state() == ConnectionState::Connected {
                        client.mark_disconnected();
                    }
                }
            }

            debug!("Connection monitor task stopped");
        })
    }

    /// Stop the monitor; the task exits at its next tick
    pub fn stop(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }
}
