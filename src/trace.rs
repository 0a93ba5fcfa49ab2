//! Scoped trace recording.
//!
//! A `TraceScope` owns one output artifact for the duration of one scenario:
//! acquire with [`TraceScope::begin`], record through cloned [`TraceSession`]
//! handles, and the artifact is flushed on every exit path (explicit
//! [`TraceScope::finish`] on the happy path, `Drop` on unwind). Events use
//! the chrome trace-event JSON format so any compatible viewer can open the
//! output; nothing in this crate interprets recorded events.

use crate::{BenchError, BenchResult};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;

// ────────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────────

/// Capture options for one trace scope.
///
/// `file_info` annotates records with their source location, `reclaim_events`
/// keeps buffer-release markers, `cross_thread` labels worker-thread lanes in
/// the output.
#[derive(Debug, Clone, Copy)]
pub struct TraceOptions {
    pub file_info: bool,
    pub reclaim_events: bool,
    pub cross_thread: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            file_info: true,
            reclaim_events: true,
            cross_thread: false,
        }
    }
}

impl TraceOptions {
    pub fn with_cross_thread(mut self, enabled: bool) -> Self {
        self.cross_thread = enabled;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Event records
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TraceRecord {
    name: String,
    cat: &'static str,
    ph: &'static str,
    ts: f64,
    pid: u32,
    tid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct TraceFile {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<TraceRecord>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────────

struct SessionInner {
    epoch: Instant,
    options: TraceOptions,
    pid: u32,
    events: Mutex<Vec<TraceRecord>>,
    lanes: Mutex<HashMap<ThreadId, u64>>,
}

/// Cheap cloneable recording handle, safe to share across worker threads.
#[derive(Clone)]
pub struct TraceSession {
    inner: Arc<SessionInner>,
}

impl TraceSession {
    fn now_us(&self) -> f64 {
        self.inner.epoch.elapsed().as_secs_f64() * 1_000_000.0
    }

    fn push(&self, record: TraceRecord) {
        self.inner.events.lock().push(record);
    }

    /// Lane id for the calling thread, assigned on first use. With
    /// `cross_thread` enabled the lane is labelled with the thread name.
    fn lane(&self) -> u64 {
        let id = thread::current().id();
        let tid = {
            let mut lanes = self.inner.lanes.lock();
            if let Some(&tid) = lanes.get(&id) {
                return tid;
            }
            let tid = lanes.len() as u64;
            lanes.insert(id, tid);
            tid
        };
        if self.inner.options.cross_thread {
            let name = thread::current()
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("thread-{}", tid));
            self.push(TraceRecord {
                name: "thread_name".to_string(),
                cat: "__metadata",
                ph: "M",
                ts: 0.0,
                pid: self.inner.pid,
                tid,
                dur: None,
                args: Some(json!({ "name": name })),
            });
        }
        tid
    }

    #[track_caller]
    fn source_args(&self) -> Option<serde_json::Value> {
        if self.inner.options.file_info {
            let loc = Location::caller();
            Some(json!({ "file": loc.file(), "line": loc.line() }))
        } else {
            None
        }
    }

    /// Open a duration span; the event is recorded when the guard drops.
    #[track_caller]
    pub fn span(&self, name: impl Into<String>) -> SpanGuard {
        let args = self.source_args();
        SpanGuard {
            session: self.clone(),
            name: name.into(),
            tid: self.lane(),
            ts: self.now_us(),
            start: Instant::now(),
            args,
        }
    }

    /// Record a zero-duration marker (cooperative yields and the like).
    #[track_caller]
    pub fn instant(&self, name: &str) {
        let args = self.source_args();
        let record = TraceRecord {
            name: name.to_string(),
            cat: "marker",
            ph: "i",
            ts: self.now_us(),
            pid: self.inner.pid,
            tid: self.lane(),
            dur: None,
            args,
        };
        self.push(record);
    }

    /// Record a buffer-release marker. A no-op unless the scope was opened
    /// with `reclaim_events` set.
    pub fn reclaim(&self, name: &str, bytes: usize) {
        if !self.inner.options.reclaim_events {
            return;
        }
        let record = TraceRecord {
            name: name.to_string(),
            cat: "reclaim",
            ph: "i",
            ts: self.now_us(),
            pid: self.inner.pid,
            tid: self.lane(),
            dur: None,
            args: Some(json!({ "bytes": bytes })),
        };
        self.push(record);
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        self.inner.events.lock().len()
    }
}

/// RAII guard for one recorded span. Dropping it closes the span.
pub struct SpanGuard {
    session: TraceSession,
    name: String,
    tid: u64,
    ts: f64,
    start: Instant,
    args: Option<serde_json::Value>,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        let dur = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.session.push(TraceRecord {
            name: std::mem::take(&mut self.name),
            cat: "task",
            ph: "X",
            ts: self.ts,
            pid: self.session.inner.pid,
            tid: self.tid,
            dur: Some(dur),
            args: self.args.take(),
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Scope
// ────────────────────────────────────────────────────────────────────────────────

/// One trace artifact, open for the duration of one scenario.
pub struct TraceScope {
    session: TraceSession,
    path: PathBuf,
    flushed: bool,
}

impl TraceScope {
    /// Open a named scope. The artifact is written when the scope closes.
    pub fn begin(path: impl Into<PathBuf>, options: TraceOptions) -> BenchResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let session = TraceSession {
            inner: Arc::new(SessionInner {
                epoch: Instant::now(),
                options,
                pid: std::process::id(),
                events: Mutex::new(Vec::new()),
                lanes: Mutex::new(HashMap::new()),
            }),
        };
        if options.file_info {
            let tid = session.lane();
            session.push(TraceRecord {
                name: "process_name".to_string(),
                cat: "__metadata",
                ph: "M",
                ts: 0.0,
                pid: session.inner.pid,
                tid,
                dur: None,
                args: Some(json!({
                    "name": format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
                })),
            });
        }
        Ok(Self {
            session,
            path,
            flushed: false,
        })
    }

    /// Recording handle for this scope.
    pub fn session(&self) -> TraceSession {
        self.session.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and persist the artifact, surfacing I/O errors.
    pub fn finish(mut self) -> BenchResult<()> {
        self.flush()
    }

    fn flush(&mut self) -> BenchResult<()> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        let trace_events = std::mem::take(&mut *self.session.inner.events.lock());
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(
            &mut writer,
            &TraceFile {
                trace_events,
                display_time_unit: "ms",
            },
        )
        .map_err(|e| BenchError::Trace(format!("serialize {}: {}", self.path.display(), e)))?;
        writer.flush()?;
        Ok(())
    }
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        // Best-effort flush on unwind; finish() is the error-surfacing path.
        let _ = self.flush();
    }
}
