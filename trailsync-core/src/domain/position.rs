use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::side::{PositionSide, Side};

/// One view of "what position do we hold".
///
/// Two of these exist per strategy instance: the locally asserted view and
/// the externally reported one. A view is normalized on construction: a flat
/// side always carries quantity zero and a zero quantity is always flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub side: PositionSide,
    pub quantity: u32,
    pub last_update: DateTime<Utc>,
}

impl PositionView {
    pub fn new(side: PositionSide, quantity: u32, at: DateTime<Utc>) -> Self {
        if side.is_flat() || quantity == 0 {
            return Self::flat(at);
        }
        Self {
            side,
            quantity,
            last_update: at,
        }
    }

    pub fn flat(at: DateTime<Utc>) -> Self {
        Self {
            side: PositionSide::Flat,
            quantity: 0,
            last_update: at,
        }
    }

    pub fn open(side: Side, quantity: u32, at: DateTime<Utc>) -> Self {
        Self::new(side.into(), quantity, at)
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat() && self.quantity == 0
    }

    /// True if this view shows an open position on `side`.
    pub fn holds(&self, side: Side) -> bool {
        self.side == PositionSide::from(side) && self.quantity > 0
    }

    /// Side and quantity equality, ignoring timestamps.
    pub fn same_position(&self, other: &PositionView) -> bool {
        self.side == other.side && self.quantity == other.quantity
    }
}

impl fmt::Display for PositionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.side, self.quantity)
    }
}
