// src/instance.rs

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;
use sysinfo::{Pid, System};
use uuid::Uuid;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Record the process start. Call first thing in `main`; later calls keep the
/// first instant.
pub fn mark_process_start() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// Memory figures for the running process, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Resident set size of this process
    pub rss: u64,
    /// Virtual memory size of this process
    #[serde(rename = "virtual")]
    pub virtual_memory: u64,
    pub system_total: u64,
    pub system_used: u64,
}

/// Who served a request: attached to every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub instance_id: Uuid,
    pub hostname: String,
    pub pid: u32,
    /// Seconds since the process started
    pub uptime: f64,
    pub port: u16,
    pub memory: MemoryUsage,
}

/// Human-oriented uptime split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeBreakdown {
    pub seconds: f64,
    pub minutes: u64,
    pub hours: u64,
    pub days: u64,
    pub formatted: String,
}

impl UptimeBreakdown {
    pub fn from_seconds(seconds: f64) -> Self {
        let minutes = (seconds.max(0.0) / 60.0).floor() as u64;
        let hours = minutes / 60;
        let days = hours / 24;

        Self {
            seconds,
            minutes,
            hours,
            days,
            formatted: format!(
                "{} days, {} hours, {} minutes",
                days,
                hours % 24,
                minutes % 60
            ),
        }
    }
}

/// Memory summary reported by the stats endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub used: String,
    pub total: String,
    /// Process RSS as a share of total system memory, not a heap ratio
    pub percentage: String,
}

impl MemoryReport {
    /// Process resident memory against total system memory
    pub fn from_usage(usage: &MemoryUsage) -> Self {
        let percentage = if usage.system_total == 0 {
            0.0
        } else {
            usage.rss as f64 / usage.system_total as f64 * 100.0
        };

        Self {
            used: format!("{} MB", (usage.rss as f64 / BYTES_PER_MB).round() as u64),
            total: format!("{} MB", (usage.system_total as f64 / BYTES_PER_MB).round() as u64),
            percentage: format!("{:.2}%", percentage),
        }
    }
}

/// Produces fresh [`InstanceSnapshot`]s for this process
#[derive(Debug)]
pub struct InstanceReporter {
    instance_id: Uuid,
    hostname: String,
    pid: u32,
    port: u16,
    started: Instant,
    system: Mutex<System>,
}

impl InstanceReporter {
    pub fn new(port: u16) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            port,
            started: mark_process_start(),
            system: Mutex::new(System::new()),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Sample memory usage for this process
    pub fn memory(&self) -> MemoryUsage {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pid = Pid::from_u32(self.pid);
        system.refresh_memory();
        system.refresh_process(pid);

        let (rss, virtual_memory) = system
            .process(pid)
            .map(|process| (process.memory(), process.virtual_memory()))
            .unwrap_or_default();

        MemoryUsage {
            rss,
            virtual_memory,
            system_total: system.total_memory(),
            system_used: system.used_memory(),
        }
    }

    pub fn snapshot(&self) -> InstanceSnapshot {
        InstanceSnapshot {
            instance_id: self.instance_id,
            hostname: self.hostname.clone(),
            pid: self.pid,
            uptime: self.uptime_seconds(),
            port: self.port,
            memory: self.memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_describes_this_process() {
        let reporter = InstanceReporter::new(3000);
        let snapshot = reporter.snapshot();

        assert_eq!(snapshot.pid, std::process::id());
        assert_eq!(snapshot.port, 3000);
        assert_eq!(snapshot.instance_id, reporter.instance_id());
        assert!(!snapshot.hostname.is_empty());
        assert!(snapshot.uptime >= 0.0);
    }

    #[test]
    fn test_snapshots_are_fresh() {
        let reporter = InstanceReporter::new(3000);
        let first = reporter.snapshot();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = reporter.snapshot();

        assert!(second.uptime > first.uptime);
        assert_eq!(first.instance_id, second.instance_id);
    }

    #[test]
    fn test_uptime_counts_from_process_start() {
        let start = mark_process_start();
        std::thread::sleep(std::time::Duration::from_millis(20));

        // Built late, but still measured from the recorded start
        let reporter = InstanceReporter::new(3000);
        assert!(reporter.uptime_seconds() >= 0.02);
        assert_eq!(mark_process_start(), start);
        assert_eq!(reporter.hostname(), reporter.snapshot().hostname);
    }

    #[test]
    fn test_uptime_breakdown() {
        // 1 day, 2 hours, 3 minutes and 4.5 seconds
        let seconds = 86_400.0 + 2.0 * 3_600.0 + 3.0 * 60.0 + 4.5;
        let breakdown = UptimeBreakdown::from_seconds(seconds);

        assert_eq!(breakdown.days, 1);
        assert_eq!(breakdown.hours, 26);
        assert_eq!(breakdown.minutes, 1_563);
        assert_eq!(breakdown.formatted, "1 days, 2 hours, 3 minutes");
    }

    #[test]
    fn test_uptime_breakdown_under_a_minute() {
        let breakdown = UptimeBreakdown::from_seconds(42.0);
        assert_eq!(breakdown.minutes, 0);
        assert_eq!(breakdown.formatted, "0 days, 0 hours, 0 minutes");
    }

    #[test]
    fn test_memory_report_percentage() {
        let usage = MemoryUsage {
            rss: 256 * 1024 * 1024,
            virtual_memory: 0,
            system_total: 1024 * 1024 * 1024,
            system_used: 0,
        };
        let report = MemoryReport::from_usage(&usage);

        assert_eq!(report.used, "256 MB");
        assert_eq!(report.total, "1024 MB");
        assert_eq!(report.percentage, "25.00%");
    }

    #[test]
    fn test_memory_report_without_system_total() {
        let report = MemoryReport::from_usage(&MemoryUsage::default());
        assert_eq!(report.percentage, "0.00%");
    }
}
