//! Benchmarks for the rule decision path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trading_core::{names, IndicatorSnapshot};
use trading_strategies::{DecisionEngine, EngineConfig};

fn snapshot(rsi: f64) -> IndicatorSnapshot {
    IndicatorSnapshot::new("EURUSD", 0, 1.1050, 500)
        .with(names::EMA_FAST, 1.1050)
        .with(names::EMA_SLOW, 1.1020)
        .with(names::ADX, 30.0)
        .with(names::RSI, rsi)
        .with(names::ATR, 0.0012)
        .with(names::ATR_MEAN, 0.0011)
        .with(names::BOLLINGER_UPPER, 1.1080)
        .with(names::BOLLINGER_LOWER, 1.0980)
}

fn benchmark_decide(c: &mut Criterion) {
    let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
    let firing = snapshot(55.0);
    let quiet = snapshot(50.0);

    c.bench_function("decide/trend_fires", |b| {
        b.iter(|| engine.decide(black_box(&firing), None))
    });
    c.bench_function("decide/no_signal", |b| {
        b.iter(|| engine.decide(black_box(&quiet), None))
    });
}

criterion_group!(benches, benchmark_decide);
criterion_main!(benches);
