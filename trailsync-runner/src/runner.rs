//! Session runner: replays bars through a strategy context and a paper broker.
//!
//! Two entry points:
//! - `run_session_from_file()`: loads bars from CSV, then runs. Used by CLI.
//! - `run_session()`: takes pre-loaded bars. Used by sweeps and tests.
//!
//! Broker callbacks are delivered in timestamp order and interleaved with
//! bars: every callback due at or before a bar's close is applied before that
//! bar is evaluated. Callbacks are stamped in simulated time, so a session is
//! fully deterministic for a given config and bar file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use trailsync_core::domain::{BarInput, PositionView, TradeRecord};
use trailsync_core::ledger::{RecentSummary, Statistics};
use trailsync_core::reconcile::ReportOutcome;
use trailsync_core::strategy::{ExitReason, OrderIntent, StrategyContext};

use crate::broker::{BrokerEvent, BrokerEventKind, PaperBroker};
use crate::config::{ConfigError, RunId, SessionConfig};
use crate::data_loader::{load_bars, LoadError};
use crate::metrics::PerformanceSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("strategy error: {0}")]
    Strategy(#[from] trailsync_core::config::ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("no bars to replay")]
    NoBars,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// How the external position reports were absorbed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub debounced: usize,
    pub in_sync: usize,
    pub corrected: usize,
}

/// Stop level at one bar close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopPoint {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stop_price: f64,
}

/// Complete result of a single replay session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: SessionConfig,
    pub bar_count: usize,
    pub summary: PerformanceSummary,
    pub statistics: Statistics,
    pub recent: RecentSummary,
    pub trades: Vec<TradeRecord>,
    pub entries: usize,
    pub stop_exits: usize,
    pub signal_exits: usize,
    #[serde(default)]
    pub session_exits: usize,
    /// Rejection label → count.
    pub rejections: BTreeMap<String, usize>,
    pub reports: ReportCounts,
    pub forced_resyncs: usize,
    pub dropped_intents: usize,
    pub final_local: PositionView,
    pub final_reported: PositionView,
    pub stop_trace: Vec<StopPoint>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load bars from `bars_path` and replay them.
pub fn run_session_from_file(
    config: &SessionConfig,
    bars_path: &Path,
) -> Result<SessionResult, RunError> {
    let bars = load_bars(bars_path)?;
    run_session(config, &bars)
}

/// Replay pre-loaded bars without I/O.
pub fn run_session(config: &SessionConfig, bars: &[BarInput]) -> Result<SessionResult, RunError> {
    config.validate()?;
    let first = bars.first().ok_or(RunError::NoBars)?;
    let mut ctx = StrategyContext::new(config.strategy.clone(), first.bar.timestamp)?;
    let mut broker = PaperBroker::new(config.broker.clone());
    let mut tally = Tally::default();
    let mut stop_trace = Vec::new();

    info!(
        session = %config.name,
        symbol = %config.symbol,
        bars = bars.len(),
        "session started"
    );

    for input in bars {
        let now = input.bar.timestamp;
        for event in broker.drain_until(now) {
            tally.apply(&mut ctx, event);
        }

        let window_open = config.window.as_ref().map_or(true, |w| w.is_open(now));
        let outcome = ctx.on_bar(input, window_open);
        for rejection in &outcome.rejections {
            *tally.rejections.entry(rejection.label().to_string()).or_default() += 1;
        }
        for intent in &outcome.intents {
            let price = match intent {
                OrderIntent::Exit {
                    reason: ExitReason::StopHit { level },
                    ..
                } => {
                    tally.stop_exits += 1;
                    *level
                }
                OrderIntent::Exit {
                    reason: ExitReason::SessionClose,
                    ..
                } => {
                    tally.session_exits += 1;
                    input.bar.close
                }
                OrderIntent::Exit { .. } => {
                    tally.signal_exits += 1;
                    input.bar.close
                }
                OrderIntent::Enter { .. } => {
                    tally.entries += 1;
                    input.bar.close
                }
            };
            debug!(?intent, price, "intent submitted");
            broker.submit(intent, price, now);
        }
        if let Some(stop_price) = outcome.stop_price {
            stop_trace.push(StopPoint {
                timestamp: now,
                stop_price,
            });
        }
    }

    if config.flatten_at_end {
        if let Some(last) = bars.last() {
            let now = last.bar.timestamp;
            for intent in ctx.flatten(now) {
                tally.session_exits += 1;
                debug!(?intent, price = last.bar.close, "session close intent submitted");
                broker.submit(&intent, last.bar.close, now);
            }
        }
    }

    for event in broker.drain_all() {
        tally.apply(&mut ctx, event);
    }
    if !ctx.reconciler().local().is_flat() {
        warn!(position = %ctx.reconciler().local(), "session ended with an open position");
    }

    let statistics = ctx.statistics().clone();
    let result = SessionResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        config: config.clone(),
        bar_count: bars.len(),
        summary: PerformanceSummary::compute(&statistics),
        recent: ctx.recent_summary(config.recent_trades),
        trades: ctx.ledger().trades().to_vec(),
        entries: tally.entries,
        stop_exits: tally.stop_exits,
        signal_exits: tally.signal_exits,
        session_exits: tally.session_exits,
        rejections: tally.rejections,
        reports: tally.reports,
        forced_resyncs: ctx.reconciler().forced_resyncs(),
        dropped_intents: broker.dropped(),
        final_local: ctx.reconciler().local().clone(),
        final_reported: ctx.reconciler().reported().clone(),
        stop_trace,
        statistics,
    };
    info!(
        session = %config.name,
        trades = result.summary.trade_count,
        total_pnl = result.summary.total_pnl,
        "session finished"
    );
    Ok(result)
}

#[derive(Default)]
struct Tally {
    entries: usize,
    stop_exits: usize,
    signal_exits: usize,
    session_exits: usize,
    rejections: BTreeMap<String, usize>,
    reports: ReportCounts,
}

impl Tally {
    fn apply(&mut self, ctx: &mut StrategyContext, event: BrokerEvent) {
        match event.kind {
            BrokerEventKind::Execution(fill) => {
                if let Err(rejection) = ctx.on_execution(&fill) {
                    *self.rejections.entry(rejection.label().to_string()).or_default() += 1;
                }
            }
            BrokerEventKind::Position { side, quantity } => {
                match ctx.on_position_report(side, quantity, event.at) {
                    ReportOutcome::Debounced => self.reports.debounced += 1,
                    ReportOutcome::InSync => self.reports.in_sync += 1,
                    ReportOutcome::Corrected { .. } => self.reports.corrected += 1,
                }
            }
        }
    }
}
