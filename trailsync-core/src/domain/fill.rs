use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::side::Side;

/// Whether an execution opened or closed the round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillRole {
    Entry,
    Exit,
}

/// Execution callback from the broker.
///
/// `side` is the direction of the position the fill belongs to, not the
/// buy/sell action: an exit of a long position carries `Side::Long`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub role: FillRole,
    pub side: Side,
    pub price: f64,
    pub quantity: u32,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    pub fn entry(side: Side, price: f64, quantity: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: FillRole::Entry,
            side,
            price,
            quantity,
            timestamp,
        }
    }

    pub fn exit(side: Side, price: f64, quantity: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: FillRole::Exit,
            side,
            price,
            quantity,
            timestamp,
        }
    }
}
