//! Crossover detection on the externally supplied fast/slow series.
//!
//! A bullish crossover is the fast value moving from at-or-below the slow
//! value on the prior bar to strictly above it on the current bar. Bearish is
//! the mirror image.

use serde::{Deserialize, Serialize};

use crate::domain::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    Bullish,
    Bearish,
}

/// Pure crossover predicate over two consecutive (fast, slow) pairs.
pub fn detect_crossover(prev: (f64, f64), cur: (f64, f64)) -> Option<Crossover> {
    let (prev_fast, prev_slow) = prev;
    let (fast, slow) = cur;
    if ![prev_fast, prev_slow, fast, slow].iter().all(|v| v.is_finite()) {
        return None;
    }
    if prev_fast <= prev_slow && fast > slow {
        Some(Crossover::Bullish)
    } else if prev_fast >= prev_slow && fast < slow {
        Some(Crossover::Bearish)
    } else {
        None
    }
}

/// Remembers the previous bar's pair so crossovers can be evaluated per bar.
#[derive(Debug, Clone, Default)]
pub struct CrossoverTracker {
    prev: Option<(f64, f64)>,
}

impl CrossoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current bar's indicators; returns the crossover, if any.
    ///
    /// Non-finite snapshots are skipped and do not replace the stored pair.
    pub fn observe(&mut self, snapshot: &IndicatorSnapshot) -> Option<Crossover> {
        if !snapshot.fast.is_finite() || !snapshot.slow.is_finite() {
            return None;
        }
        let cur = (snapshot.fast, snapshot.slow);
        let crossover = self.prev.and_then(|prev| detect_crossover(prev, cur));
        self.prev = Some(cur);
        crossover
    }
}
