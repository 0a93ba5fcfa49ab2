//! Criterion microbenchmarks for workload and trace-recording overhead.
//!
//! Run with: `cargo bench --bench micro`

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use schedbench::trace::{TraceOptions, TraceScope};
use schedbench::workloads::{CpuWorkload, Workload};
use tempfile::TempDir;

fn bench_cpu_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_workload");

    for iterations in [1_000u64, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("run", iterations),
            &iterations,
            |b, &n| {
                let workload = CpuWorkload::new(n);
                b.iter_batched(
                    || {
                        let tmp = TempDir::new().unwrap();
                        let scope = TraceScope::begin(
                            tmp.path().join("bench.json"),
                            TraceOptions::default(),
                        )
                        .unwrap();
                        let session = scope.session();
                        (tmp, scope, session)
                    },
                    |(_tmp, _scope, session)| {
                        workload.run(&session).unwrap();
                    },
                    BatchSize::PerIteration,
                );
            },
        );
    }
    group.finish();
}

fn bench_span_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_span");

    group.bench_function("record_100_spans", |b| {
        b.iter_batched(
            || {
                let tmp = TempDir::new().unwrap();
                let scope =
                    TraceScope::begin(tmp.path().join("spans.json"), TraceOptions::default())
                        .unwrap();
                let session = scope.session();
                (tmp, scope, session)
            },
            |(_tmp, _scope, session)| {
                for i in 0..100 {
                    let _span = session.span(format!("op-{}", i));
                }
            },
            BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_cpu_workload, bench_span_recording);
criterion_main!(benches);
