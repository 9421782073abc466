//! Strategy loop: one owned context per strategy instance.
//!
//! Per bar (after warm-up):
//! 1. Crossover evaluation on the fast/slow pair
//! 2. Entry proposal on a crossover
//! 3. Stop adoption for positions the context did not open itself
//! 4. Stop update and stop-hit exit
//! 5. Signal exit on the opposite crossover
//!
//! Broker callbacks (`on_position_report`, `on_execution`) interleave with
//! bars and are applied one at a time.

pub mod intent;

pub use intent::{ExitReason, OrderIntent};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, StrategyConfig};
use crate::domain::{BarInput, Fill, PositionSide, Side, TradeRecord};
use crate::error::Rejection;
use crate::ledger::{ExecutionLedger, RecentSummary, Statistics};
use crate::reconcile::{Reconciler, ReportOutcome};
use crate::signal::{Crossover, CrossoverTracker};
use crate::stop::{StopEngine, StopStatus};

/// Everything the loop decided on one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarOutcome {
    pub timestamp: DateTime<Utc>,
    /// True while the context is still inside its warm-up bars.
    pub warming_up: bool,
    pub crossover: Option<Crossover>,
    pub intents: Vec<OrderIntent>,
    pub rejections: Vec<Rejection>,
    pub stop_status: StopStatus,
    /// Stop level after all of this bar's decisions.
    pub stop_price: Option<f64>,
}

impl BarOutcome {
    fn new(timestamp: DateTime<Utc>, crossover: Option<Crossover>) -> Self {
        Self {
            timestamp,
            warming_up: false,
            crossover,
            intents: Vec::new(),
            rejections: Vec::new(),
            stop_status: StopStatus::Inactive,
            stop_price: None,
        }
    }
}

/// State of one strategy instance. Instances share nothing.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    config: StrategyConfig,
    reconciler: Reconciler,
    stop: StopEngine,
    ledger: ExecutionLedger,
    signals: CrossoverTracker,
    bars_seen: usize,
}

impl StrategyContext {
    /// Validate `config` and build a flat context starting at `started_at`.
    pub fn new(config: StrategyConfig, started_at: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reconciler: Reconciler::new(config.direction, config.debounce_window(), started_at),
            stop: StopEngine::new(config.stop_params()),
            ledger: ExecutionLedger::new(config.point_value),
            signals: CrossoverTracker::new(),
            bars_seen: 0,
            config,
        })
    }

    /// Run the per-bar decision sequence at the close of `input.bar`.
    pub fn on_bar(&mut self, input: &BarInput, window_open: bool) -> BarOutcome {
        let bar = &input.bar;
        let now = bar.timestamp;
        let index = self.bars_seen;
        self.bars_seen += 1;

        // The tracker sees every bar so the first post-warm-up bar has a prior pair.
        let crossover = self.signals.observe(&input.indicators);
        let mut outcome = BarOutcome::new(now, crossover);
        if index < self.config.bars_required_to_trade {
            outcome.warming_up = true;
            return outcome;
        }

        // ── Entries ──
        let mut entered = false;
        if let Some(cross) = crossover {
            let side = match cross {
                Crossover::Bullish => Side::Long,
                Crossover::Bearish => Side::Short,
            };
            match self
                .reconciler
                .propose_entry(side, self.config.quantity, now, window_open)
            {
                Ok(accepted) => {
                    self.stop.init(accepted.side, bar.close);
                    outcome.intents.push(OrderIntent::Enter {
                        side: accepted.side,
                        quantity: accepted.quantity,
                    });
                    entered = true;
                }
                Err(rejection) => {
                    debug!(?cross, %rejection, "entry rejected");
                    outcome.rejections.push(rejection);
                }
            }
        }

        // A heal inside the entry proposal may have forced local flat.
        if self.reconciler.local().is_flat() && self.stop.is_active() {
            debug!("local forced flat, dropping stop state");
            self.stop.teardown();
        }

        // ── Adoption ──
        if let Some(side) = self.reconciler.local().side.as_side() {
            if !self.stop.is_active() {
                let entry_price = self
                    .ledger
                    .pending_entry()
                    .filter(|pending| pending.side == side)
                    .map_or(bar.close, |pending| pending.price);
                info!(%side, entry_price, "adopting externally opened position");
                self.stop.init(side, entry_price);
            }
        }

        // ── Stop management ──
        // The entry bar's close is the entry price; management starts next bar.
        let mut stopped_out: Option<Side> = None;
        if !entered && !self.reconciler.local().is_flat() {
            let status = self.stop.update(bar, input.indicators.volatility);
            outcome.stop_status = status;
            if let StopStatus::Hit(level) = status {
                if let Some(side) = self.reconciler.local().side.as_side() {
                    self.exit(side, ExitReason::StopHit { level }, now, &mut outcome);
                    stopped_out = Some(side);
                }
            }
        } else if !self.reconciler.local().is_flat() {
            if let Some(level) = self.stop.stop_price() {
                outcome.stop_status = StopStatus::Holding(level);
            }
        }

        // ── Signal exits ──
        let signal_exit = match crossover {
            Some(Crossover::Bearish) => Some(Side::Long),
            Some(Crossover::Bullish) => Some(Side::Short),
            None => None,
        };
        if let Some(side) = signal_exit {
            if stopped_out != Some(side) && self.reconciler.holds(side) {
                self.exit(side, ExitReason::Signal, now, &mut outcome);
            }
        }

        outcome.stop_price = self.stop.stop_price();
        outcome
    }

    fn exit(
        &mut self,
        side: Side,
        reason: ExitReason,
        now: DateTime<Utc>,
        outcome: &mut BarOutcome,
    ) {
        match self.reconciler.propose_exit(side, now) {
            Ok(accepted) => {
                self.stop.teardown();
                outcome.intents.push(OrderIntent::Exit {
                    side: accepted.side,
                    quantity: accepted.quantity,
                    reason,
                });
            }
            Err(rejection) => outcome.rejections.push(rejection),
        }
    }

    /// Close whatever either view holds, at `now`.
    ///
    /// Used at session close. Returns the exit intents; nothing is emitted
    /// when both views are flat.
    pub fn flatten(&mut self, now: DateTime<Utc>) -> Vec<OrderIntent> {
        let mut outcome = BarOutcome::new(now, None);
        for side in [Side::Long, Side::Short] {
            if self.reconciler.holds(side) {
                self.exit(side, ExitReason::SessionClose, now, &mut outcome);
            }
        }
        if !outcome.intents.is_empty() {
            info!(exits = outcome.intents.len(), "flattened at session close");
        }
        outcome.intents
    }

    /// Apply a position report from the external feed.
    ///
    /// A resync to a different side (or to flat) drops the stop state; the
    /// next bar adopts whatever position is now held.
    pub fn on_position_report(
        &mut self,
        side: PositionSide,
        quantity: u32,
        timestamp: DateTime<Utc>,
    ) -> ReportOutcome {
        let outcome = self.reconciler.on_external_report(side, quantity, timestamp);
        if let ReportOutcome::Corrected { from, to } = outcome {
            if from != to {
                self.stop.teardown();
            }
        }
        outcome
    }

    /// Apply a broker execution to the ledger.
    pub fn on_execution(&mut self, fill: &Fill) -> Result<Option<TradeRecord>, Rejection> {
        self.ledger.on_fill(fill)
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn stop_engine(&self) -> &StopEngine {
        &self.stop
    }

    pub fn ledger(&self) -> &ExecutionLedger {
        &self.ledger
    }

    pub fn statistics(&self) -> &Statistics {
        self.ledger.statistics()
    }

    pub fn recent_summary(&self, n: usize) -> RecentSummary {
        self.ledger.recent_summary(n)
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.stop.stop_price()
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }
}
