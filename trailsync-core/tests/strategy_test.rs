//! End-to-end strategy loop tests with a hand-driven broker.
//!
//! Each test plays the host: it feeds bars, turns intents into fills and
//! position reports, and checks what the context decided.

use chrono::{DateTime, Duration, TimeZone, Utc};
use trailsync_core::config::{DirectionMode, StrategyConfig};
use trailsync_core::domain::{Bar, BarInput, Fill, IndicatorSnapshot, PositionSide, Side};
use trailsync_core::error::Rejection;
use trailsync_core::reconcile::ReportOutcome;
use trailsync_core::stop::StopStatus;
use trailsync_core::strategy::{ExitReason, OrderIntent, StrategyContext};

// ── Helpers ──────────────────────────────────────────────────────────

fn at(min: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap() + Duration::minutes(min)
}

fn bar_input(min: i64, close: f64, low: f64, fast: f64) -> BarInput {
    BarInput {
        bar: Bar {
            timestamp: at(min),
            open: close,
            high: close + 0.25,
            low,
            close,
        },
        indicators: IndicatorSnapshot {
            fast,
            slow: 100.0,
            volatility: 0.5,
        },
    }
}

fn context(config: StrategyConfig) -> StrategyContext {
    StrategyContext::new(config, at(0)).unwrap()
}

fn no_warmup() -> StrategyConfig {
    StrategyConfig {
        bars_required_to_trade: 0,
        ..StrategyConfig::default()
    }
}

/// Deliver the fill and position report an instant broker would send.
fn confirm(ctx: &mut StrategyContext, intent: &OrderIntent, price: f64, when: DateTime<Utc>) {
    match *intent {
        OrderIntent::Enter { side, quantity } => {
            ctx.on_execution(&Fill::entry(side, price, quantity, when))
                .unwrap();
            ctx.on_position_report(side.into(), quantity, when + Duration::milliseconds(100));
        }
        OrderIntent::Exit { side, quantity, .. } => {
            ctx.on_execution(&Fill::exit(side, price, quantity, when))
                .unwrap();
            ctx.on_position_report(PositionSide::Flat, 0, when + Duration::milliseconds(100));
        }
    }
}

// ── Round trips ──────────────────────────────────────────────────────

#[test]
fn long_round_trip_through_breakeven_stop() {
    let mut ctx = context(no_warmup());

    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    let out = ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);
    assert_eq!(out.intents.len(), 1);
    confirm(&mut ctx, &out.intents[0], 100.0, at(2));

    let out = ctx.on_bar(&bar_input(3, 105.0, 104.75, 102.0), true);
    assert_eq!(out.stop_status, StopStatus::Holding(100.5));

    let out = ctx.on_bar(&bar_input(4, 98.0, 97.75, 102.0), true);
    assert_eq!(out.stop_status, StopStatus::Hit(100.5));
    assert_eq!(
        out.intents,
        vec![OrderIntent::Exit {
            side: Side::Long,
            quantity: 1,
            reason: ExitReason::StopHit { level: 100.5 },
        }]
    );
    confirm(&mut ctx, &out.intents[0], 100.5, at(4));

    let stats = ctx.statistics();
    assert_eq!(stats.total_trades, 1);
    assert_eq!(stats.winning_trades, 1);
    assert_eq!(stats.total_pnl, 0.5);
    assert!(ctx.reconciler().agreement().is_agreed());
    assert!(ctx.reconciler().local().is_flat());
}

#[test]
fn next_crossover_after_round_trip_enters_again() {
    let mut ctx = context(no_warmup());
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    let out = ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);
    confirm(&mut ctx, &out.intents[0], 100.0, at(2));

    // Bearish crossover: short entry blocked, long closed on signal.
    let out = ctx.on_bar(&bar_input(3, 99.5, 99.25, 99.0), true);
    assert_eq!(out.rejections, vec![Rejection::NotFlat]);
    let exit = out.intents[0];
    assert!(matches!(
        exit,
        OrderIntent::Exit {
            side: Side::Long,
            reason: ExitReason::Signal,
            ..
        }
    ));
    confirm(&mut ctx, &exit, 99.5, at(3));
    assert_eq!(ctx.statistics().losing_trades, 1);

    // Bullish again: synchronized and flat, so a new long goes out.
    let out = ctx.on_bar(&bar_input(4, 100.0, 99.75, 101.0), true);
    assert_eq!(
        out.intents,
        vec![OrderIntent::Enter {
            side: Side::Long,
            quantity: 1
        }]
    );
}

#[test]
fn long_only_mode_never_shorts() {
    let config = StrategyConfig {
        direction: DirectionMode::LongOnly,
        ..no_warmup()
    };
    let mut ctx = context(config);
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 101.0), true);
    let out = ctx.on_bar(&bar_input(2, 100.0, 99.75, 99.0), true);
    assert!(out.intents.is_empty());
    assert_eq!(out.rejections, vec![Rejection::DirectionDisallowed]);
}

#[test]
fn closed_window_still_manages_open_position() {
    let mut ctx = context(no_warmup());
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    let out = ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);
    confirm(&mut ctx, &out.intents[0], 100.0, at(2));

    // Window closes; the stop keeps trailing and can still fire.
    let out = ctx.on_bar(&bar_input(3, 105.0, 104.75, 102.0), false);
    assert_eq!(out.stop_price, Some(100.5));
    let out = ctx.on_bar(&bar_input(4, 98.0, 97.75, 102.0), false);
    assert!(out.stop_status.is_hit());
    assert_eq!(out.intents.len(), 1);
}

#[test]
fn heal_before_rejected_entry_drops_stop() {
    let config = StrategyConfig {
        direction: DirectionMode::LongOnly,
        ..no_warmup()
    };
    let mut ctx = context(config);
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    let out = ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);
    assert_eq!(out.intents.len(), 1);
    assert_eq!(out.stop_price, Some(95.0));

    // The entry report never arrives. An hour later the bearish cross heals
    // local to flat, then the short is refused by the direction mode.
    let out = ctx.on_bar(&bar_input(62, 100.0, 99.75, 99.0), true);
    assert_eq!(out.rejections, vec![Rejection::DirectionDisallowed]);
    assert!(out.intents.is_empty());
    assert_eq!(ctx.reconciler().forced_resyncs(), 1);
    assert!(ctx.reconciler().local().is_flat());

    assert!(!ctx.stop_engine().is_active());
    assert_eq!(out.stop_status, StopStatus::Inactive);
    assert_eq!(out.stop_price, None);
}

#[test]
fn closed_window_does_not_heal() {
    let mut ctx = context(no_warmup());
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);

    // Same lost report, but the cross lands outside the window.
    let out = ctx.on_bar(&bar_input(62, 100.0, 99.75, 99.0), false);
    assert_eq!(out.rejections, vec![Rejection::WindowClosed]);
    assert_eq!(ctx.reconciler().forced_resyncs(), 0);

    // Local still holds the long, so the bearish cross closes it.
    assert!(matches!(
        out.intents[..],
        [OrderIntent::Exit {
            side: Side::Long,
            reason: ExitReason::Signal,
            ..
        }]
    ));
}

#[test]
fn stale_position_echo_is_debounced_then_corrected() {
    let mut ctx = context(no_warmup());
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);

    // Confirming report within the window is a no-op for local.
    let outcome = ctx.on_position_report(PositionSide::Long, 1, at(2) + Duration::seconds(1));
    assert_eq!(outcome, ReportOutcome::Debounced);
    assert!(ctx.stop_engine().is_active());

    // The broker later says flat (position closed externally).
    let outcome = ctx.on_position_report(PositionSide::Flat, 0, at(2) + Duration::seconds(30));
    assert_eq!(
        outcome,
        ReportOutcome::Corrected {
            from: PositionSide::Long,
            to: PositionSide::Flat
        }
    );
    assert!(!ctx.stop_engine().is_active());
    assert!(ctx.reconciler().local().is_flat());
}

#[test]
fn warm_up_suppresses_entries() {
    let config = StrategyConfig {
        bars_required_to_trade: 3,
        ..StrategyConfig::default()
    };
    let mut ctx = context(config);
    ctx.on_bar(&bar_input(1, 100.0, 99.75, 99.0), true);
    ctx.on_bar(&bar_input(2, 100.0, 99.75, 101.0), true);
    let out = ctx.on_bar(&bar_input(3, 100.0, 99.75, 99.0), true);
    assert!(out.warming_up);
    assert!(out.intents.is_empty());

    // Fourth bar is the first live one; crossover from the warm-up bar counts.
    let out = ctx.on_bar(&bar_input(4, 100.0, 99.75, 101.0), true);
    assert!(!out.warming_up);
    assert_eq!(out.intents.len(), 1);
}

#[test]
fn invalid_config_is_rejected() {
    let config = StrategyConfig {
        tick_size: 0.0,
        ..StrategyConfig::default()
    };
    assert!(StrategyContext::new(config, at(0)).is_err());
}
