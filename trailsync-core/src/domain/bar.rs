//! Bar: the fundamental market data unit, plus the per-bar indicator inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC bar for the traded instrument.
///
/// The timestamp is the bar close time. Decisions taken on a bar are taken at
/// its close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Indicator values produced by the external signal source for one bar.
///
/// `fast` and `slow` are the two moving averages whose crossovers drive
/// entries and exits. `volatility` is an absolute price distance (ATR-like).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub fast: f64,
    pub slow: f64,
    pub volatility: f64,
}

impl IndicatorSnapshot {
    pub fn is_finite(&self) -> bool {
        self.fast.is_finite() && self.slow.is_finite() && self.volatility.is_finite()
    }
}

/// Everything the strategy loop consumes for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarInput {
    pub bar: Bar,
    pub indicators: IndicatorSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn snapshot_rejects_nan() {
        let snap = IndicatorSnapshot {
            fast: 1.0,
            slow: f64::NAN,
            volatility: 0.5,
        };
        assert!(!snap.is_finite());
    }
}
