// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for instrumentation overhead.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use callmeter::config::InstrumentationConfig;
use callmeter::metrics::{HistogramMetric, Instrumentation, LabelSet, MetricsRegistry, DEFAULT_BUCKETS};

/// Benchmark wrapping a trivial operation.
fn bench_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics/measure");

    let instrumentation = Instrumentation::new(
        Arc::new(MetricsRegistry::new()),
        &InstrumentationConfig::default(),
    )
    .unwrap();
    let labels = LabelSet::from([("controller", "Projects::CommitController"), ("action", "show")]);

    group.bench_function("existing_tracker", |b| {
        let mut tx = instrumentation.transaction(labels.clone());
        b.iter(|| tx.with_instrumentation("Commit", "diffs", || black_box(1 + 1)));
    });

    group.bench_function("transaction_lifecycle", |b| {
        b.iter(|| {
            let mut tx = instrumentation.transaction(labels.clone());
            for method in ["commit", "diffs", "notes"] {
                tx.with_instrumentation("Repository", method, || black_box(method.len()));
            }
            black_box(tx.finalize())
        });
    });

    group.finish();
}

/// Benchmark histogram observation across series counts.
fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics/observe");

    for series in [1usize, 10, 100] {
        let hist = HistogramMetric::new("bench", "Bench", DEFAULT_BUCKETS.to_vec()).unwrap();
        let label_sets: Vec<LabelSet> = (0..series)
            .map(|i| LabelSet::from([("method", format!("m{i}"))]))
            .collect();

        group.bench_with_input(BenchmarkId::new("series", series), &label_sets, |b, sets| {
            let mut i = 0usize;
            b.iter(|| {
                hist.observe(&sets[i % sets.len()], black_box(0.3));
                i += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_measure, bench_observe);
criterion_main!(benches);
