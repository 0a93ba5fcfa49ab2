//! Workload definitions.
//!
//! Two workload kinds drive the battery: a CPU-bound arithmetic loop that
//! yields cooperatively at chunk boundaries, and an I/O-bound blocking pause.

use crate::trace::TraceSession;
use crate::BenchResult;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use std::thread;
use std::time::Duration;

/// One unit of benchmark work. Implementations must be shareable across
/// worker threads; they hold no mutable state of their own.
pub trait Workload: Send + Sync {
    fn name(&self) -> &str;

    /// Run the workload once on the calling thread.
    fn run(&self, session: &TraceSession) -> BenchResult<()>;
}

// ────────────────────────────────────────────────────────────────────────────────
// CPU-bound
// ────────────────────────────────────────────────────────────────────────────────

/// Bounded arithmetic work, sliced into `chunks` pieces. After every
/// non-final slice the worker yields to the scheduler; whether that actually
/// interleaves workers is a best-effort hint, not a guarantee.
pub struct CpuWorkload {
    pub iterations: u64,
    pub chunks: u64,
    pub seed: u64,
}

impl CpuWorkload {
    pub fn new(iterations: u64) -> Self {
        Self {
            iterations,
            chunks: 100,
            seed: 42,
        }
    }
}

impl Workload for CpuWorkload {
    fn name(&self) -> &str {
        "cpu"
    }

    fn run(&self, session: &TraceSession) -> BenchResult<()> {
        if self.iterations == 0 {
            return Ok(());
        }
        let chunk = (self.iterations / self.chunks).max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut done = 0u64;
        while done < self.iterations {
            let len = chunk.min(self.iterations - done) as usize;
            let buf: Vec<f64> = (0..len).map(|_| rng.gen::<f64>() * 100.0).collect();
            let min = buf.iter().copied().fold(f64::INFINITY, f64::min);
            black_box(min);
            let bytes = buf.capacity() * std::mem::size_of::<f64>();
            drop(buf);
            session.reclaim("cpu_chunk", bytes);
            done += len as u64;
            if done < self.iterations {
                session.instant("yield");
                thread::yield_now();
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// I/O-bound
// ────────────────────────────────────────────────────────────────────────────────

/// Blocks the calling worker for a fixed pause, modeling a blocking I/O
/// wait. A zero pause returns without sleeping.
pub struct IoWorkload {
    pub pause: Duration,
}

impl IoWorkload {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }
}

impl Workload for IoWorkload {
    fn name(&self) -> &str {
        "io"
    }

    fn run(&self, _session: &TraceSession) -> BenchResult<()> {
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceOptions, TraceScope};
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_cpu_zero_iterations_is_immediate() {
        let tmp = TempDir::new().unwrap();
        let scope =
            TraceScope::begin(tmp.path().join("cpu0.json"), TraceOptions::default()).unwrap();
        let session = scope.session();
        let before = session.event_count();

        let start = Instant::now();
        CpuWorkload::new(0).run(&session).unwrap();

        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(session.event_count(), before);
    }

    #[test]
    fn test_cpu_yields_between_chunks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cpu.json");
        let scope = TraceScope::begin(&path, TraceOptions::default()).unwrap();
        let session = scope.session();

        CpuWorkload::new(1_000).run(&session).unwrap();
        scope.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let events = value["traceEvents"].as_array().unwrap();
        let yields = events.iter().filter(|e| e["name"] == "yield").count();
        let reclaims = events.iter().filter(|e| e["cat"] == "reclaim").count();
        // 100 chunks of 10 iterations: a yield between each pair of chunks.
        assert_eq!(yields, 99);
        assert_eq!(reclaims, 100);
    }

    #[test]
    fn test_io_zero_pause_does_not_block() {
        let tmp = TempDir::new().unwrap();
        let scope =
            TraceScope::begin(tmp.path().join("io0.json"), TraceOptions::default()).unwrap();
        let session = scope.session();

        let start = Instant::now();
        IoWorkload::new(Duration::ZERO).run(&session).unwrap();
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_io_blocks_for_pause() {
        let tmp = TempDir::new().unwrap();
        let scope =
            TraceScope::begin(tmp.path().join("io.json"), TraceOptions::default()).unwrap();
        let session = scope.session();

        let pause = Duration::from_millis(30);
        let start = Instant::now();
        IoWorkload::new(pause).run(&session).unwrap();
        assert!(start.elapsed() >= pause);
    }
}
