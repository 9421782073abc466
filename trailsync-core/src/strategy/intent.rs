/// Strategy order intents
///
/// The strategy loop emits *intents*, never fills. Whoever hosts the context
/// (a live adapter or the paper broker) turns them into orders and feeds the
/// resulting executions and position reports back.
use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Why a position is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Opposite crossover.
    Signal,
    /// Trailing stop crossed at `level`.
    StopHit { level: f64 },
    /// Flattened at the end of the session.
    SessionClose,
}

/// Order intent emitted by the strategy loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderIntent {
    /// Open a new position at market
    Enter { side: Side, quantity: u32 },

    /// Close the position on `side` at market
    Exit {
        side: Side,
        quantity: u32,
        reason: ExitReason,
    },
}

impl OrderIntent {
    pub fn side(&self) -> Side {
        match self {
            OrderIntent::Enter { side, .. } | OrderIntent::Exit { side, .. } => *side,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            OrderIntent::Enter { quantity, .. } | OrderIntent::Exit { quantity, .. } => *quantity,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, OrderIntent::Enter { .. })
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, OrderIntent::Exit { .. })
    }
}
