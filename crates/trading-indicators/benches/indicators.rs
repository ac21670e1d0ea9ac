//! Benchmarks for snapshot building.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::Bar;
use trading_indicators::{SnapshotBuilder, SnapshotConfig};

fn generate_test_bars(size: usize) -> Vec<Bar> {
    (0..size)
        .map(|i| {
            let close = 1.1 + (i as f64 * 0.1).sin() * 0.01;
            Bar::new(i as i64 * 60_000, close, close + 0.0005, close - 0.0005, close, 100.0)
        })
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("SnapshotBuilder");

    for size in [500, 1000, 10000].iter() {
        let bars = generate_test_bars(*size);

        group.bench_with_input(BenchmarkId::new("build", size), &bars, |b, bars| {
            b.iter(|| SnapshotBuilder::build("EURUSD", SnapshotConfig::default(), black_box(bars)))
        });
    }

    group.finish();
}

fn benchmark_push(c: &mut Criterion) {
    let bars = generate_test_bars(1000);
    let mut builder = SnapshotBuilder::new("EURUSD", SnapshotConfig::default()).unwrap();
    for bar in &bars {
        builder.push(bar).unwrap();
    }
    let next = bars[bars.len() - 1];

    c.bench_function("SnapshotBuilder/push", |b| {
        b.iter(|| builder.push(black_box(&next)))
    });
}

criterion_group!(benches, benchmark_build, benchmark_push);
criterion_main!(benches);
