//! Static strategy configuration.
//!
//! Distances (`trailing_stop_points`, `profit_trigger_points`) are measured in
//! ticks of `tick_size`. Everything here is fixed for the life of a run.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Side;
use crate::stop::StopParams;

/// Errors from loading or validating a strategy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which entry directions the strategy may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectionMode {
    #[default]
    Both,
    LongOnly,
    ShortOnly,
}

impl DirectionMode {
    pub fn permits(self, side: Side) -> bool {
        match self {
            DirectionMode::Both => true,
            DirectionMode::LongOnly => side == Side::Long,
            DirectionMode::ShortOnly => side == Side::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Base trailing distance, in ticks.
    pub trailing_stop_points: f64,
    /// Multiplier applied to the volatility input to form the noise floor.
    pub atr_multiplier: f64,
    /// Profit (ticks) that arms breakeven and starts tightening.
    pub profit_trigger_points: f64,
    /// Fraction of the base distance removed per profit level.
    pub progressive_tightening_rate: f64,
    /// Contracts per entry.
    pub quantity: u32,
    /// Currency value of a one-point price move per contract.
    pub point_value: f64,
    pub tick_size: f64,
    pub direction: DirectionMode,
    /// Grace period during which a fresh local assertion survives stale reports.
    pub debounce_ms: i64,
    /// Bars observed before any decision is taken (indicator warm-up).
    pub bars_required_to_trade: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            trailing_stop_points: 20.0,
            atr_multiplier: 2.5,
            profit_trigger_points: 5.0,
            progressive_tightening_rate: 0.2,
            quantity: 1,
            point_value: 1.0,
            tick_size: 0.25,
            direction: DirectionMode::Both,
            debounce_ms: 2_000,
            bars_required_to_trade: 50,
        }
    }
}

impl StrategyConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StrategyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("trailing_stop_points", self.trailing_stop_points, 1.0, 10_000.0)?;
        check_range("atr_multiplier", self.atr_multiplier, 0.1, 5.0)?;
        check_range("profit_trigger_points", self.profit_trigger_points, 1.0, 50.0)?;
        check_range(
            "progressive_tightening_rate",
            self.progressive_tightening_rate,
            0.05,
            0.5,
        )?;
        check_positive("quantity", f64::from(self.quantity))?;
        check_positive("point_value", self.point_value)?;
        check_positive("tick_size", self.tick_size)?;
        if self.debounce_ms < 0 {
            return Err(ConfigError::NotPositive {
                field: "debounce_ms",
                value: self.debounce_ms as f64,
            });
        }
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::milliseconds(self.debounce_ms)
    }

    pub fn stop_params(&self) -> StopParams {
        StopParams {
            base_distance_ticks: self.trailing_stop_points,
            atr_multiplier: self.atr_multiplier,
            profit_trigger_ticks: self.profit_trigger_points,
            tightening_rate: self.progressive_tightening_rate,
            tick_size: self.tick_size,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}
