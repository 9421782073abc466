//! Rejection taxonomy for proposals and fills.
//!
//! None of these are faults: every variant is handled locally by rejecting
//! the proposal or ignoring the callback. The strategy loop keeps running.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// Local and reported views disagree; retry after the next reconciliation.
    #[error("local and reported positions are not synchronized")]
    NotSynchronized,
    /// Entry attempted while already in (or entering) a position.
    #[error("entry rejected: a position is already open")]
    NotFlat,
    /// Entry side forbidden by the configured direction mode.
    #[error("entry side not permitted by direction mode")]
    DirectionDisallowed,
    /// Entry attempted outside the trading window.
    #[error("entry rejected: trading window is closed")]
    WindowClosed,
    /// Entry requested with zero contracts.
    #[error("entry quantity must be positive")]
    ZeroQuantity,
    /// Exit requested for a side neither view holds.
    #[error("no open position on the requested side")]
    NoOpenPosition,
    /// Exit fill arrived with nothing pending (duplicate or out-of-order callback).
    #[error("exit fill with no pending entry")]
    NoPendingEntry,
}

impl Rejection {
    /// Stable snake_case label for counters and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::NotSynchronized => "not_synchronized",
            Rejection::NotFlat => "not_flat",
            Rejection::DirectionDisallowed => "direction_disallowed",
            Rejection::WindowClosed => "window_closed",
            Rejection::ZeroQuantity => "zero_quantity",
            Rejection::NoOpenPosition => "no_open_position",
            Rejection::NoPendingEntry => "no_pending_entry",
        }
    }
}
