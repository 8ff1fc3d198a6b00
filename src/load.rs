// src/load.rs

use std::time::{Duration, Instant};

/// Duration used when the caller does not ask for one
pub const DEFAULT_LOAD_DURATION: Duration = Duration::from_millis(1000);

/// Square roots summed per round; the clock is only checked between rounds
const OPS_PER_ROUND: u32 = 1000;

/// What a synthetic load run did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadReport {
    pub requested: Duration,
    pub elapsed: Duration,
    pub rounds: u64,
    /// `sum % 1000` of all square roots computed; a pure function of `rounds`
    pub checksum: f64,
}

/// Busy-spin on floating point work for `duration`.
///
/// Blocks the calling thread for the whole duration; callers on an async
/// runtime should run it through `spawn_blocking`.
pub fn burn_cpu(duration: Duration) -> LoadReport {
    let start = Instant::now();
    let mut sum = 0.0_f64;
    let mut rounds = 0_u64;

    while start.elapsed() < duration {
        sum += round_sum();
        rounds += 1;
    }

    LoadReport {
        requested: duration,
        elapsed: start.elapsed(),
        rounds,
        checksum: sum % 1000.0,
    }
}

fn round_sum() -> f64 {
    let mut sum = 0.0_f64;
    for i in 0..OPS_PER_ROUND {
        sum += std::hint::black_box(f64::from(i)).sqrt();
    }
    sum
}

/// Interpret the `duration` query parameter in milliseconds.
///
/// Missing, empty or zero values fall back to the default; anything that is
/// not a non-negative integer, or exceeds `max`, is rejected.
pub fn parse_duration(raw: Option<&str>, max: Duration) -> Result<Duration, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_LOAD_DURATION),
        Some(raw) => raw,
    };

    let millis: u64 = raw
        .parse()
        .map_err(|_| format!("duration must be a whole number of milliseconds, got '{}'", raw))?;

    if millis == 0 {
        return Ok(DEFAULT_LOAD_DURATION);
    }

    let duration = Duration::from_millis(millis);
    if duration > max {
        return Err(format!(
            "duration {}ms exceeds the maximum of {}ms",
            millis,
            max.as_millis()
        ));
    }

    Ok(duration)
}
