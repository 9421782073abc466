//! Trading-hours window evaluated as a pure predicate.
//!
//! The window is expressed in exchange-local time: bar timestamps are shifted
//! by `utc_offset_hours` before comparison. A window whose end is before its
//! start wraps past midnight.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub utc_offset_hours: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            utc_offset_hours: 0,
            enabled: true,
        }
    }

    /// True if entries are allowed at `timestamp`. Bounds are inclusive.
    ///
    /// A disabled window is always open.
    pub fn is_open(&self, timestamp: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        let local = (timestamp + Duration::hours(i64::from(self.utc_offset_hours))).time();
        if self.start <= self.end {
            self.start <= local && local <= self.end
        } else {
            local >= self.start || local <= self.end
        }
    }

    /// Offsets beyond a day are never meaningful.
    pub fn validate(&self) -> Result<(), String> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(format!(
                "utc_offset_hours must be within -23..=23, got {}",
                self.utc_offset_hours
            ));
        }
        Ok(())
    }
}
