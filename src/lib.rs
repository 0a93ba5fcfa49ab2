//! Shared types, error handling and latency recording for schedbench.

pub mod report;
pub mod runner;
pub mod scenarios;
pub mod trace;
pub mod workloads;

use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::{Duration, Instant};

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug)]
pub enum BenchError {
    Io(std::io::Error),
    Trace(String),
    Config(String),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::Io(e) => write!(f, "IO error: {}", e),
            BenchError::Trace(s) => write!(f, "Trace error: {}", s),
            BenchError::Config(s) => write!(f, "Config error: {}", s),
        }
    }
}

impl std::error::Error for BenchError {}

impl From<std::io::Error> for BenchError {
    fn from(e: std::io::Error) -> Self {
        BenchError::Io(e)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Latency recorder (HDR histogram)
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LatencyRecorder {
    hist: Histogram<u64>,
    total: Duration,
    ops: u64,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).unwrap(),
            total: Duration::ZERO,
            ops: 0,
        }
    }

    /// Start a latency measurement.
    #[inline(always)]
    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// Record the elapsed time since `start`.
    #[inline(always)]
    pub fn record(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let nanos = elapsed.as_nanos() as u64;
        let _ = self.hist.record(nanos.max(1));
        self.total += elapsed;
        self.ops += 1;
    }

    pub fn ops(&self) -> u64 {
        self.ops
    }

    pub fn total_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }

    /// Percentile in microseconds.
    pub fn percentile_us(&self, p: f64) -> f64 {
        self.hist.value_at_percentile(p) as f64 / 1_000.0
    }

    /// Mean latency in microseconds.
    pub fn mean_us(&self) -> f64 {
        self.hist.mean() / 1_000.0
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Run output types
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub key: String,
    pub label: String,
    pub mode: String,
    pub tasks: usize,
    pub ops: u64,
    pub wall_secs: f64,
    pub p50_us: f64,
    pub p99_us: f64,
    pub mean_us: f64,
    pub events: usize,
    pub trace_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSuite {
    pub system_info: SystemInfo,
    pub results: Vec<ScenarioResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            timestamp: epoch_timestamp(),
        }
    }
}

fn epoch_timestamp() -> String {
    // simple ISO-ish timestamp without pulling in chrono
    let d = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}s-since-epoch", d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_recorder() {
        let mut rec = LatencyRecorder::new();

        for i in 1..=100u64 {
            let start = Instant::now() - Duration::from_micros(i * 10);
            rec.record(start);
        }

        assert_eq!(rec.ops(), 100);
        assert!(rec.percentile_us(50.0) > 0.0);
        assert!(rec.percentile_us(99.0) >= rec.percentile_us(50.0));
        assert!(rec.total_secs() > 0.0);
    }

    #[test]
    fn test_system_info() {
        let info = SystemInfo::collect();
        assert!(info.cpus >= 1);
        assert!(!info.os.is_empty());
        assert!(info.timestamp.ends_with("s-since-epoch"));
    }
}
