/// Ratchet invariant enforcement
///
/// **Core Rule:** once engaged, the stop may tighten, never loosen (even if
/// volatility expands).
///
/// Before engagement the level is provisional: the first offered level always
/// takes effect, whichever way it moves.
use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Ratchet state for one position's stop level.
///
/// - Long positions: level can only rise once engaged
/// - Short positions: level can only fall once engaged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ratchet {
    side: Side,
    level: f64,
    engaged: bool,
}

impl Ratchet {
    /// Create a ratchet holding a provisional (not yet engaged) level.
    pub fn provisional(side: Side, initial_level: f64) -> Self {
        Self {
            side,
            level: initial_level,
            engaged: false,
        }
    }

    /// Offer a candidate level.
    ///
    /// Returns true if the candidate replaced the current level: always on the
    /// first offer, afterwards only when strictly more favorable.
    ///
    /// # Example
    /// ```
    /// use trailsync_core::domain::Side;
    /// use trailsync_core::stop::Ratchet;
    ///
    /// let mut ratchet = Ratchet::provisional(Side::Long, 95.0);
    ///
    /// // First offer engages, even though it is lower
    /// assert!(ratchet.offer(94.0));
    ///
    /// // Tightening: $94 → $100 (allowed)
    /// assert!(ratchet.offer(100.0));
    ///
    /// // Loosening: $100 → $90 (blocked, stays at $100)
    /// assert!(!ratchet.offer(90.0));
    /// assert_eq!(ratchet.level(), 100.0);
    /// ```
    pub fn offer(&mut self, candidate: f64) -> bool {
        if !self.engaged {
            self.level = candidate;
            self.engaged = true;
            return true;
        }
        if self.side.improves(candidate, self.level) {
            self.level = candidate;
            return true;
        }
        false
    }

    /// Engage at `level`, keeping the current level if it is already better.
    pub fn engage_at(&mut self, level: f64) {
        if !self.engaged || self.side.improves(level, self.level) {
            self.level = level;
        }
        self.engaged = true;
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn side(&self) -> Side {
        self.side
    }
}
