//! Sequential and concurrent workload runners.
//!
//! Both runners drive one workload `tasks` times and collect per-task
//! latencies. The concurrent runner spawns named worker threads in ascending
//! index order and returns only after every worker has been joined; a worker
//! panic is re-raised on the calling thread, but only once the join barrier
//! is complete, so callers never observe partial completion.

use crate::trace::TraceSession;
use crate::workloads::Workload;
use crate::{BenchResult, LatencyRecorder};
use parking_lot::Mutex;
use std::panic;
use std::thread;
use std::time::Instant;

#[derive(Debug)]
pub struct RunStats {
    pub tasks: u64,
    pub recorder: LatencyRecorder,
}

/// Invoke the workload `tasks` times, strictly in order, on the calling
/// thread. Total wall time is the sum of the per-task times.
pub fn run_sequential(
    session: &TraceSession,
    tasks: usize,
    workload: &dyn Workload,
) -> BenchResult<RunStats> {
    let mut recorder = LatencyRecorder::new();
    for i in 0..tasks {
        let _span = session.span(format!("{}-task-{}", workload.name(), i + 1));
        let start = recorder.start();
        workload.run(session)?;
        recorder.record(start);
    }
    Ok(RunStats {
        tasks: tasks as u64,
        recorder,
    })
}

/// Start `workers` independent worker threads, each invoking the workload
/// once, then wait for all of them. Start order is ascending; completion
/// order is unspecified.
pub fn run_concurrent(
    session: &TraceSession,
    workers: usize,
    workload: &dyn Workload,
) -> BenchResult<RunStats> {
    let recorder = Mutex::new(LatencyRecorder::new());

    thread::scope(|scope| -> BenchResult<()> {
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let worker_session = session.clone();
            let recorder = &recorder;
            let name = format!("{}-worker-{}", workload.name(), i);
            let span_name = name.clone();
            let handle = thread::Builder::new().name(name).spawn_scoped(
                scope,
                move || -> BenchResult<()> {
                    let _span = worker_session.span(span_name);
                    let start = Instant::now();
                    workload.run(&worker_session)?;
                    recorder.lock().record(start);
                    Ok(())
                },
            )?;
            handles.push(handle);
        }
        tracing::debug!(workers, workload = workload.name(), "workers started");

        // Join every worker before surfacing any failure.
        let mut first_err = None;
        let mut first_panic = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(payload) => {
                    if first_panic.is_none() {
                        first_panic = Some(payload);
                    }
                }
            }
        }
        tracing::debug!(workers, "all workers joined");

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })?;

    Ok(RunStats {
        tasks: workers as u64,
        recorder: recorder.into_inner(),
    })
}
