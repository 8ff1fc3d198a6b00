// src/bin/counter_probe.rs

use indicatif::{ProgressBar, ProgressStyle};
use prettytable::{row, Table};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use structopt::StructOpt;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use counter_service::http::responses::CounterResponse;

#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "counter_probe",
    about = "Drives traffic at one or more counter service instances and reports what each served"
)]
struct Opt {
    /// Base URL of the service or of the load balancer in front of it
    #[structopt(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Total number of requests to send
    #[structopt(short = "n", long, default_value = "200")]
    requests: usize,

    /// Number of requests in flight at once
    #[structopt(short, long, default_value = "10")]
    concurrency: usize,

    /// Share of requests that increment instead of read (0.0 to 1.0)
    #[structopt(short, long, default_value = "0.2")]
    write_ratio: f64,

    /// Reset the counter before starting
    #[structopt(long)]
    reset: bool,

    /// Per-request timeout in milliseconds
    #[structopt(long, default_value = "5000")]
    timeout_ms: u64,

    /// Verbosity level
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,

    /// Disable logs
    #[structopt(long)]
    disable_logs: bool,
}

/// What one instance answered during the run
#[derive(Debug, Clone)]
struct InstanceTally {
    hostname: String,
    port: u16,
    reads: u64,
    writes: u64,
    cache_hits: u64,
    min_counter: u64,
    max_counter: u64,
}

impl InstanceTally {
    fn new(response: &CounterResponse) -> Self {
        Self {
            hostname: response.instance.hostname.clone(),
            port: response.instance.port,
            reads: 0,
            writes: 0,
            cache_hits: 0,
            min_counter: response.counter,
            max_counter: response.counter,
        }
    }

    fn record(&mut self, response: &CounterResponse, write: bool) {
        if write {
            self.writes += 1;
        } else {
            self.reads += 1;
            if response.cached {
                self.cache_hits += 1;
            }
        }
        self.min_counter = self.min_counter.min(response.counter);
        self.max_counter = self.max_counter.max(response.counter);
    }
}

#[derive(Debug, Default)]
struct ProbeStats {
    by_instance: Mutex<HashMap<Uuid, InstanceTally>>,
    errors: AtomicUsize,
}

impl ProbeStats {
    fn record(&self, response: &CounterResponse, write: bool) {
        let mut by_instance = match self.by_instance.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        by_instance
            .entry(response.instance.instance_id)
            .or_insert_with(|| InstanceTally::new(response))
            .record(response, write);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    let log_level = if opt.disable_logs {
        "error"
    } else {
        match opt.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!("counter_probe={}", log_level)))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !(0.0..=1.0).contains(&opt.write_ratio) {
        return Err(format!("write ratio must be between 0 and 1, got {}", opt.write_ratio).into());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(opt.timeout_ms))
        .build()?;
    let base = opt.url.trim_end_matches('/').to_string();

    // Ctrl+C stops dispatching; requests already in flight finish and are reported
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    if opt.reset {
        let response = client
            .post(format!("{}/api/counter/reset", base))
            .send()
            .await?
            .error_for_status()?;
        info!("Counter reset before the run ({})", response.status());
    }

    info!(
        "Sending {} requests to {} ({} concurrent, {:.0}% increments)",
        opt.requests,
        base,
        opt.concurrency,
        opt.write_ratio * 100.0
    );

    let progress = ProgressBar::new(opt.requests as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        )?
        .progress_chars("=>-"),
    );

    let stats = Arc::new(ProbeStats::default());
    let next = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let workers = (0..opt.concurrency.max(1)).map(|_| {
        let client = client.clone();
        let base = base.clone();
        let stats = Arc::clone(&stats);
        let next = Arc::clone(&next);
        let stop = Arc::clone(&stop);
        let progress = progress.clone();
        let total = opt.requests;
        let write_ratio = opt.write_ratio;

        tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) && next.fetch_add(1, Ordering::SeqCst) < total {
                let write = rand::rng().random_bool(write_ratio);
                let request = if write {
                    client.post(format!("{}/api/counter/increment", base))
                } else {
                    client.get(format!("{}/api/counter", base))
                };

                match send(request).await {
                    Ok(response) => {
                        debug!(
                            "{} -> {} (cached: {}, instance: {})",
                            if write { "increment" } else { "read" },
                            response.counter,
                            response.cached,
                            response.instance.instance_id
                        );
                        stats.record(&response, write);
                    }
                    Err(e) => {
                        warn!("Request failed: {}", e);
                        stats.errors.fetch_add(1, Ordering::SeqCst);
                    }
                }
                progress.inc(1);
            }
        })
    });

    for result in futures::future::join_all(workers).await {
        if let Err(e) = result {
            warn!("Worker task failed: {}", e);
        }
    }

    let elapsed = started.elapsed();
    if stop.load(Ordering::SeqCst) {
        progress.abandon_with_message("interrupted");
    } else {
        progress.finish_with_message("done");
    }

    print_summary(&stats, elapsed);
    Ok(())
}

async fn send(request: reqwest::RequestBuilder) -> Result<CounterResponse, reqwest::Error> {
    request.send().await?.error_for_status()?.json().await
}

fn print_summary(stats: &ProbeStats, elapsed: Duration) {
    let by_instance = match stats.by_instance.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let mut table = Table::new();
    table.set_titles(row![
        "Instance",
        "Host:Port",
        "Reads",
        "Writes",
        "Cache hits",
        "Counter range"
    ]);

    let mut rows: Vec<_> = by_instance.iter().collect();
    rows.sort_by_key(|(_, tally)| (tally.hostname.clone(), tally.port));

    let mut answered = 0;
    for (id, tally) in rows {
        answered += tally.reads + tally.writes;
        let hit_rate = if tally.reads > 0 {
            tally.cache_hits as f64 / tally.reads as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(row![
            id.to_string(),
            format!("{}:{}", tally.hostname, tally.port),
            tally.reads,
            tally.writes,
            format!("{} ({:.1}%)", tally.cache_hits, hit_rate),
            format!("{}..={}", tally.min_counter, tally.max_counter)
        ]);
    }

    println!();
    table.printstd();

    let errors = stats.errors.load(Ordering::SeqCst);
    println!(
        "{} answered, {} failed in {:.2}s across {} instance(s)",
        answered,
        errors,
        elapsed.as_secs_f64(),
        by_instance.len()
    );
    if by_instance.len() > 1 {
        println!("Instances keep separate counters; reads may return another instance's value");
    }
}
