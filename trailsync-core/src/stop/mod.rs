//! Adaptive trailing stop for a single open position.
//!
//! The engine blends three distances into one stop level:
//! breakeven protection, profit-proportional tightening, and a volatility
//! floor. The resulting level obeys the ratchet invariant: once trailing is
//! active, a long stop never falls and a short stop never rises.
//!
//! Lifecycle: `Uninitialized → Armed → BreakevenSet → Trailing → Closed`.
//! Transitions only move forward; `Closed` drops the state.

pub mod engine;
pub mod ratchet;

pub use engine::StopEngine;
pub use ratchet::Ratchet;

use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Stop distance from entry used by breakeven protection, in ticks.
pub const BREAKEVEN_OFFSET_TICKS: f64 = 2.0;

/// Profit ticks per tightening level.
pub const TICKS_PER_PROFIT_LEVEL: f64 = 5.0;

/// Tightening never reduces the base distance below this fraction of it.
pub const MIN_DISTANCE_FRACTION: f64 = 0.2;

/// Numeric parameters of the stop engine, derived from the strategy config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopParams {
    pub base_distance_ticks: f64,
    pub atr_multiplier: f64,
    pub profit_trigger_ticks: f64,
    pub tightening_rate: f64,
    pub tick_size: f64,
}

impl StopParams {
    /// Trailing distance in ticks after profit-proportional tightening.
    pub fn tightened_distance(&self, profit_ticks: f64) -> f64 {
        let base = self.base_distance_ticks;
        if profit_ticks <= self.profit_trigger_ticks {
            return base;
        }
        let levels = (profit_ticks - self.profit_trigger_ticks) / TICKS_PER_PROFIT_LEVEL;
        let reduction = levels * self.tightening_rate * base;
        (base - reduction).max(base * MIN_DISTANCE_FRACTION)
    }

    /// Volatility noise floor in ticks.
    pub fn volatility_distance(&self, volatility: f64) -> f64 {
        self.atr_multiplier * volatility / self.tick_size
    }

    /// Distance actually used: tightened, but never inside the noise floor.
    pub fn effective_distance(&self, profit_ticks: f64, volatility: f64) -> f64 {
        self.tightened_distance(profit_ticks)
            .max(self.volatility_distance(volatility))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StopPhase {
    /// Initial protective stop; breakeven not reached yet.
    Armed,
    /// Breakeven was applied on the latest update; settles for one cycle.
    BreakevenSet,
    /// Breakeven in place and the stop trails price.
    Trailing,
}

/// Result of a stop update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StopStatus {
    /// No position is being managed.
    Inactive,
    /// Stop holds at the given level.
    Holding(f64),
    /// The bar crossed the stop; exit at the given level.
    Hit(f64),
}

impl StopStatus {
    pub fn stop_price(&self) -> Option<f64> {
        match self {
            StopStatus::Inactive => None,
            StopStatus::Holding(p) | StopStatus::Hit(p) => Some(*p),
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, StopStatus::Hit(_))
    }
}

/// Stop state of the open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopState {
    side: Side,
    entry_price: f64,
    ratchet: Ratchet,
    breakeven_activated: bool,
    phase: StopPhase,
}

impl StopState {
    fn new(side: Side, entry_price: f64, initial_stop: f64) -> Self {
        Self {
            side,
            entry_price,
            ratchet: Ratchet::provisional(side, initial_stop),
            breakeven_activated: false,
            phase: StopPhase::Armed,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn stop_price(&self) -> f64 {
        self.ratchet.level()
    }

    pub fn breakeven_activated(&self) -> bool {
        self.breakeven_activated
    }

    pub fn trailing_activated(&self) -> bool {
        self.ratchet.is_engaged()
    }

    pub fn phase(&self) -> StopPhase {
        self.phase
    }
}
