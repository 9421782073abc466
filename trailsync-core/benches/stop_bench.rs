//! Criterion benchmarks for TrailSync hot paths.
//!
//! Benchmarks:
//! 1. Stop engine update over a synthetic price path
//! 2. Full strategy loop (bars + crossovers + stop management)

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trailsync_core::config::StrategyConfig;
use trailsync_core::domain::{Bar, BarInput, IndicatorSnapshot, Side};
use trailsync_core::stop::StopEngine;
use trailsync_core::strategy::StrategyContext;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_inputs(n: usize) -> Vec<BarInput> {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 4_000.0 + (i as f64 * 0.05).sin() * 25.0;
            BarInput {
                bar: Bar {
                    timestamp: start + Duration::minutes(i as i64),
                    open: close - 0.25,
                    high: close + 1.5,
                    low: close - 1.5,
                    close,
                },
                indicators: IndicatorSnapshot {
                    fast: close + (i as f64 * 0.11).sin() * 3.0,
                    slow: close,
                    volatility: 2.0 + (i as f64 * 0.07).cos(),
                },
            }
        })
        .collect()
}

// ── 1. Stop engine ───────────────────────────────────────────────────

fn bench_stop_update(c: &mut Criterion) {
    let inputs = make_inputs(1_000);
    let params = StrategyConfig::default().stop_params();

    c.bench_function("stop_update_1000_bars", |b| {
        b.iter(|| {
            let mut engine = StopEngine::new(params);
            for input in &inputs {
                if !engine.is_active() {
                    engine.init(Side::Long, input.bar.close);
                }
                black_box(engine.update(&input.bar, input.indicators.volatility));
            }
        })
    });
}

// ── 2. Strategy loop ─────────────────────────────────────────────────

fn bench_strategy_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_loop");
    for n in [1_000usize, 10_000] {
        let inputs = make_inputs(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &inputs, |b, inputs| {
            b.iter(|| {
                let config = StrategyConfig {
                    bars_required_to_trade: 20,
                    ..StrategyConfig::default()
                };
                let mut ctx = StrategyContext::new(config, inputs[0].bar.timestamp)
                    .expect("default config is valid");
                for input in inputs {
                    black_box(ctx.on_bar(input, true));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stop_update, bench_strategy_loop);
criterion_main!(benches);
