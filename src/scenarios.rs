//! Scenario descriptors and battery orchestration.
//!
//! A scenario binds one workload kind to one execution mode and one trace
//! artifact. The stock battery reproduces the four-scenario sweep:
//! sequential CPU, threaded CPU, sequential I/O, threaded I/O.

use crate::runner;
use crate::trace::{TraceOptions, TraceScope};
use crate::workloads::{CpuWorkload, IoWorkload, Workload};
use crate::{BenchResult, ScenarioResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Threaded,
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Threaded => write!(f, "threaded"),
        }
    }
}

/// Battery parameters. Defaults reproduce the stock run: 50k CPU iterations
/// across 2 tasks or workers, and a 250ms I/O pause across 4.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cpu_iterations: u64,
    pub cpu_tasks: usize,
    pub io_pause: Duration,
    pub io_tasks: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cpu_iterations: 50_000,
            cpu_tasks: 2,
            io_pause: Duration::from_millis(250),
            io_tasks: 4,
        }
    }
}

/// One named combination of workload kind and execution mode, bound to a
/// distinct trace artifact.
pub struct Scenario {
    pub key: &'static str,
    pub label: &'static str,
    pub mode: ExecMode,
    pub tasks: usize,
    pub trace_file: &'static str,
    pub options: TraceOptions,
    workload: Box<dyn Workload>,
}

impl Scenario {
    /// The stock four-scenario battery. Cross-thread lane capture is enabled
    /// only where worker threads exist to label.
    pub fn battery(cfg: &RunConfig) -> Vec<Scenario> {
        vec![
            Scenario {
                key: "cpu-seq",
                label: "Single-Thread Sequential (CPU-Bound)",
                mode: ExecMode::Sequential,
                tasks: cfg.cpu_tasks,
                trace_file: "trace_single_thread_cpu.json",
                options: TraceOptions::default(),
                workload: Box::new(CpuWorkload::new(cfg.cpu_iterations)),
            },
            Scenario {
                key: "cpu-threaded",
                label: "Multi-Thread (CPU-Bound)",
                mode: ExecMode::Threaded,
                tasks: cfg.cpu_tasks,
                trace_file: "trace_multi_thread_cpu.json",
                options: TraceOptions::default().with_cross_thread(true),
                workload: Box::new(CpuWorkload::new(cfg.cpu_iterations)),
            },
            Scenario {
                key: "io-seq",
                label: "Single-Thread Sequential (I/O-Bound)",
                mode: ExecMode::Sequential,
                tasks: cfg.io_tasks,
                trace_file: "trace_single_thread_io.json",
                options: TraceOptions::default(),
                workload: Box::new(IoWorkload::new(cfg.io_pause)),
            },
            Scenario {
                key: "io-threaded",
                label: "Multi-Thread (I/O-Bound)",
                mode: ExecMode::Threaded,
                tasks: cfg.io_tasks,
                trace_file: "trace_multi_thread_io.json",
                options: TraceOptions::default().with_cross_thread(true),
                workload: Box::new(IoWorkload::new(cfg.io_pause)),
            },
        ]
    }

    pub fn trace_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.trace_file)
    }

    /// Open the trace scope, run the workload battery leg inside it, close
    /// the scope. The artifact is flushed on every exit path; workload
    /// errors and panics propagate to the caller.
    pub fn execute(&self, out_dir: &Path) -> BenchResult<ScenarioResult> {
        let path = self.trace_path(out_dir);
        tracing::info!(scenario = self.key, trace = %path.display(), "starting scenario");

        let scope = TraceScope::begin(&path, self.options)?;
        let session = scope.session();

        let start = Instant::now();
        let stats = match self.mode {
            ExecMode::Sequential => {
                runner::run_sequential(&session, self.tasks, self.workload.as_ref())?
            }
            ExecMode::Threaded => {
                runner::run_concurrent(&session, self.tasks, self.workload.as_ref())?
            }
        };
        let wall = start.elapsed();

        let events = session.event_count();
        scope.finish()?;

        Ok(ScenarioResult {
            key: self.key.to_string(),
            label: self.label.to_string(),
            mode: self.mode.to_string(),
            tasks: self.tasks,
            ops: stats.recorder.ops(),
            wall_secs: wall.as_secs_f64(),
            p50_us: stats.recorder.percentile_us(50.0),
            p99_us: stats.recorder.percentile_us(99.0),
            mean_us: stats.recorder.mean_us(),
            events,
            trace_path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceSession;
    use std::collections::HashSet;
    use std::panic::AssertUnwindSafe;
    use tempfile::TempDir;

    fn small_config() -> RunConfig {
        RunConfig {
            cpu_iterations: 1_000,
            cpu_tasks: 2,
            io_pause: Duration::from_millis(5),
            io_tasks: 2,
        }
    }

    #[test]
    fn test_battery_has_four_distinct_artifacts() {
        let battery = Scenario::battery(&RunConfig::default());
        assert_eq!(battery.len(), 4);

        let keys: HashSet<_> = battery.iter().map(|s| s.key).collect();
        let files: HashSet<_> = battery.iter().map(|s| s.trace_file).collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(files.len(), 4);

        let threaded: Vec<_> = battery
            .iter()
            .filter(|s| s.mode == ExecMode::Threaded)
            .collect();
        assert_eq!(threaded.len(), 2);
        assert!(threaded.iter().all(|s| s.options.cross_thread));
    }

    #[test]
    fn test_execute_writes_one_artifact_per_scenario() {
        let tmp = TempDir::new().unwrap();
        for scenario in Scenario::battery(&small_config()) {
            let result = scenario.execute(tmp.path()).unwrap();
            let path = scenario.trace_path(tmp.path());
            assert!(path.exists());
            assert_eq!(result.ops, scenario.tasks as u64);
            assert!(result.wall_secs >= 0.0);
            assert!(result.events > 0);

            let text = std::fs::read_to_string(&path).unwrap();
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert!(!value["traceEvents"].as_array().unwrap().is_empty());
        }
    }

    struct PanicWorkload;

    impl Workload for PanicWorkload {
        fn name(&self) -> &str {
            "panic"
        }

        fn run(&self, _session: &TraceSession) -> BenchResult<()> {
            panic!("workload failure");
        }
    }

    #[test]
    fn test_artifact_survives_workload_panic() {
        let tmp = TempDir::new().unwrap();
        let scenario = Scenario {
            key: "boom",
            label: "Panicking",
            mode: ExecMode::Threaded,
            tasks: 2,
            trace_file: "boom.json",
            options: TraceOptions::default(),
            workload: Box::new(PanicWorkload),
        };

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| scenario.execute(tmp.path())));
        assert!(result.is_err());

        let path = tmp.path().join("boom.json");
        assert!(path.exists());
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["traceEvents"].is_array());
    }
}
