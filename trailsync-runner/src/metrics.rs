//! Performance summary derived from the ledger statistics.
//!
//! Pure functions of a `Statistics` snapshot; nothing here is recomputed from
//! the trade list.

use serde::{Deserialize, Serialize};
use trailsync_core::ledger::Statistics;

/// Headline numbers for a session, as shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    pub total_pnl: f64,
    pub long_pnl: f64,
    pub short_pnl: f64,
    /// Percent.
    pub win_rate: f64,
    pub long_win_rate: f64,
    pub short_win_rate: f64,
    /// 0.0 when there were no losing trades.
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub max_drawdown: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceSummary {
    pub fn compute(stats: &Statistics) -> Self {
        Self {
            trade_count: stats.total_trades,
            total_pnl: stats.total_pnl,
            long_pnl: stats.long.pnl,
            short_pnl: stats.short.pnl,
            win_rate: stats.win_rate(),
            long_win_rate: stats.long.win_rate(),
            short_win_rate: stats.short.win_rate(),
            profit_factor: stats.profit_factor(),
            average_win: stats.average_win(),
            average_loss: stats.average_loss(),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            max_drawdown: stats.max_drawdown,
            max_consecutive_wins: stats.max_consecutive_wins,
            max_consecutive_losses: stats.max_consecutive_losses,
        }
    }
}
