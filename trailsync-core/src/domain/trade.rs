//! TradeRecord: a completed round-trip trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::side::Side;

/// A complete round-trip trade record: entry fill paired with its exit fill.
///
/// Created exactly once per round trip by the execution ledger and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 1-based position in the session's trade sequence.
    pub trade_number: usize,
    pub side: Side,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    // ── Size / PnL ──
    pub quantity: u32,
    pub realized_pnl: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.realized_pnl < 0.0
    }

    /// Zero-PnL trade: counted in totals, neither a win nor a loss.
    pub fn is_scratch(&self) -> bool {
        self.realized_pnl == 0.0
    }
}
