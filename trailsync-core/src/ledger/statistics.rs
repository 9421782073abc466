//! Running trade statistics.
//!
//! Updated incrementally, one completed trade at a time. Nothing is ever
//! recomputed from history, so a `Statistics` value is a pure fold over the
//! trade sequence.

use serde::{Deserialize, Serialize};

use crate::domain::{Side, TradeRecord};

/// Counts and extremes for one side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub pnl: f64,
    pub largest_win: f64,
    /// Most negative trade; zero until a loss occurs.
    pub largest_loss: f64,
}

impl SideStats {
    fn record(&mut self, pnl: f64) {
        self.trades += 1;
        self.pnl += pnl;
        if pnl > 0.0 {
            self.wins += 1;
            self.largest_win = self.largest_win.max(pnl);
        } else if pnl < 0.0 {
            self.losses += 1;
            self.largest_loss = self.largest_loss.min(pnl);
        }
    }

    /// Win rate in percent.
    pub fn win_rate(&self) -> f64 {
        percent(self.wins, self.trades)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub scratch_trades: usize,

    pub long: SideStats,
    pub short: SideStats,

    pub total_pnl: f64,
    pub gross_profit: f64,
    /// Sum of losing trades as a positive number.
    pub gross_loss: f64,
    pub largest_win: f64,
    /// Most negative trade; zero until a loss occurs.
    pub largest_loss: f64,

    // ── Drawdown on cumulative PnL ──
    pub peak_pnl: f64,
    pub current_drawdown: f64,
    pub max_drawdown: f64,

    // ── Streaks ──
    pub consecutive_wins: usize,
    pub consecutive_losses: usize,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed trade into the aggregate.
    pub fn record(&mut self, trade: &TradeRecord) {
        let pnl = trade.realized_pnl;
        self.total_trades += 1;
        self.total_pnl += pnl;

        match trade.side {
            Side::Long => self.long.record(pnl),
            Side::Short => self.short.record(pnl),
        }

        if pnl > 0.0 {
            self.winning_trades += 1;
            self.gross_profit += pnl;
            self.largest_win = self.largest_win.max(pnl);
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
            self.max_consecutive_wins = self.max_consecutive_wins.max(self.consecutive_wins);
        } else if pnl < 0.0 {
            self.losing_trades += 1;
            self.gross_loss += pnl.abs();
            self.largest_loss = self.largest_loss.min(pnl);
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
            self.max_consecutive_losses =
                self.max_consecutive_losses.max(self.consecutive_losses);
        } else {
            // Scratch trades leave streaks untouched.
            self.scratch_trades += 1;
        }

        if self.total_pnl > self.peak_pnl {
            self.peak_pnl = self.total_pnl;
            self.current_drawdown = 0.0;
        } else {
            self.current_drawdown = self.peak_pnl - self.total_pnl;
            self.max_drawdown = self.max_drawdown.max(self.current_drawdown);
        }
    }

    /// Win rate in percent; 0.0 with no trades.
    pub fn win_rate(&self) -> f64 {
        percent(self.winning_trades, self.total_trades)
    }

    /// Gross profit / gross loss.
    ///
    /// Returns 0.0 when there are no losses, matching the dashboard convention
    /// rather than reporting infinity.
    pub fn profit_factor(&self) -> f64 {
        if self.gross_loss > 0.0 {
            self.gross_profit / self.gross_loss
        } else {
            0.0
        }
    }

    pub fn average_win(&self) -> f64 {
        if self.winning_trades == 0 {
            return 0.0;
        }
        self.gross_profit / self.winning_trades as f64
    }

    /// Average losing trade as a positive number.
    pub fn average_loss(&self) -> f64 {
        if self.losing_trades == 0 {
            return 0.0;
        }
        self.gross_loss / self.losing_trades as f64
    }

    pub fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }
}

/// Summary over the most recent trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentSummary {
    pub count: usize,
    pub total_pnl: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub best: f64,
    pub worst: f64,
}

impl RecentSummary {
    /// Summarize the last `n` trades (fewer if the history is shorter).
    pub fn from_trades(trades: &[TradeRecord], n: usize) -> Self {
        let start = trades.len().saturating_sub(n);
        let window = &trades[start..];
        if window.is_empty() {
            return Self::default();
        }

        let pnls = window.iter().map(|t| t.realized_pnl);
        let wins = window.iter().filter(|t| t.is_winner()).count();
        let losses = window.iter().filter(|t| t.is_loser()).count();
        Self {
            count: window.len(),
            total_pnl: pnls.clone().sum(),
            wins,
            losses,
            win_rate: percent(wins, window.len()),
            best: pnls.clone().fold(f64::NEG_INFINITY, f64::max),
            worst: pnls.fold(f64::INFINITY, f64::min),
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
