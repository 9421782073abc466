//! Execution ledger: pairs entry and exit fills into round-trip trades.
//!
//! Statistics are only touched when a round trip completes; entries just
//! record the pending price and side.

pub mod statistics;

pub use statistics::{RecentSummary, SideStats, Statistics};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Fill, FillRole, Side, TradeRecord};
use crate::error::Rejection;

/// Number of trades in the default recent summary.
pub const DEFAULT_RECENT_TRADES: usize = 10;

/// Entry fill waiting for its exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub side: Side,
    pub price: f64,
    pub quantity: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExecutionLedger {
    point_value: f64,
    pending: Option<PendingEntry>,
    trades: Vec<TradeRecord>,
    stats: Statistics,
}

impl ExecutionLedger {
    pub fn new(point_value: f64) -> Self {
        Self {
            point_value,
            pending: None,
            trades: Vec::new(),
            stats: Statistics::new(),
        }
    }

    /// Apply one broker execution.
    ///
    /// Returns the completed trade on an exit, `Ok(None)` on an entry, and
    /// `Err(NoPendingEntry)` for an exit with nothing to pair it with.
    pub fn on_fill(&mut self, fill: &Fill) -> Result<Option<TradeRecord>, Rejection> {
        match fill.role {
            FillRole::Entry => {
                self.record_entry(fill);
                Ok(None)
            }
            FillRole::Exit => self.record_exit(fill).map(Some),
        }
    }

    fn record_entry(&mut self, fill: &Fill) {
        if !fill.price.is_finite() || fill.price <= 0.0 {
            warn!(side = %fill.side, price = fill.price, "entry fill ignored: non-positive price");
            return;
        }
        if let Some(previous) = &self.pending {
            warn!(
                side = %previous.side,
                price = previous.price,
                "pending entry replaced before its exit arrived"
            );
        }
        self.pending = Some(PendingEntry {
            side: fill.side,
            price: fill.price,
            quantity: fill.quantity,
            timestamp: fill.timestamp,
        });
    }

    fn record_exit(&mut self, fill: &Fill) -> Result<TradeRecord, Rejection> {
        let Some(entry) = self.pending.take() else {
            warn!(side = %fill.side, price = fill.price, "exit fill with no pending entry ignored");
            return Err(Rejection::NoPendingEntry);
        };
        if entry.side != fill.side {
            warn!(
                entry_side = %entry.side,
                exit_side = %fill.side,
                "exit fill side differs from pending entry, using entry side"
            );
        }

        let side = entry.side;
        let realized_pnl =
            side.sign() * (fill.price - entry.price) * f64::from(fill.quantity) * self.point_value;
        let trade = TradeRecord {
            trade_number: self.trades.len() + 1,
            side,
            entry_time: entry.timestamp,
            entry_price: entry.price,
            exit_time: fill.timestamp,
            exit_price: fill.price,
            quantity: fill.quantity,
            realized_pnl,
        };
        self.stats.record(&trade);
        info!(
            trade = trade.trade_number,
            %side,
            entry = entry.price,
            exit = fill.price,
            pnl = realized_pnl,
            total_pnl = self.stats.total_pnl,
            "trade completed"
        );
        self.trades.push(trade.clone());
        Ok(trade)
    }

    pub fn pending_entry(&self) -> Option<&PendingEntry> {
        self.pending.as_ref()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn recent_summary(&self, n: usize) -> RecentSummary {
        RecentSummary::from_trades(&self.trades, n)
    }

    pub fn point_value(&self) -> f64 {
        self.point_value
    }
}
