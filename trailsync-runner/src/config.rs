//! Serializable replay-session configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trailsync_core::config::StrategyConfig;

use crate::window::TradingWindow;

/// Unique identifier for a session run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] trailsync_core::config::ConfigError),
    #[error("invalid session: {0}")]
    Invalid(String),
}

/// Paper broker latency model.
///
/// Fills arrive `latency_ms` plus up to `jitter_ms` after the intent; the
/// position report follows `report_delay_ms` later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub latency_ms: i64,
    pub jitter_ms: i64,
    pub report_delay_ms: i64,
    pub seed: u64,
    /// Emit the pre-intent position once more before the fill.
    pub stale_echo: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            latency_ms: 250,
            jitter_ms: 100,
            report_delay_ms: 50,
            seed: 42,
            stale_echo: false,
        }
    }
}

/// Everything needed to reproduce one replay session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub window: Option<TradingWindow>,
    /// Size of the recent-trades summary.
    #[serde(default = "default_recent_trades")]
    pub recent_trades: usize,
    /// Close any open position at the last bar instead of leaving it open.
    #[serde(default)]
    pub flatten_at_end: bool,
}

fn default_recent_trades() -> usize {
    trailsync_core::ledger::DEFAULT_RECENT_TRADES
}

impl SessionConfig {
    /// Session with default strategy and broker settings.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            strategy: StrategyConfig::default(),
            broker: BrokerConfig::default(),
            window: None,
            recent_trades: default_recent_trades(),
            flatten_at_end: false,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.broker.latency_ms < 0 || self.broker.jitter_ms < 0 || self.broker.report_delay_ms < 0
        {
            return Err(ConfigError::Invalid(
                "broker delays must be non-negative".into(),
            ));
        }
        if let Some(window) = &self.window {
            window.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two sessions with identical configs replayed over the same bars
    /// produce identical results, so the id doubles as a cache key.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailsync_core::config::DirectionMode;

    const SAMPLE: &str = r#"
        name = "es-trail"
        symbol = "ES"

        [strategy]
        trailing_stop_points = 16
        atr_multiplier = 2.0
        point_value = 50.0
        direction = "LongOnly"

        [broker]
        latency_ms = 400
        stale_echo = true

        [window]
        start = "08:30:00"
        end = "15:25:00"
        utc_offset_hours = -5
    "#;

    #[test]
    fn test_parse_full_session() {
        let config = SessionConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.symbol, "ES");
        assert_eq!(config.strategy.trailing_stop_points, 16.0);
        assert_eq!(config.strategy.direction, DirectionMode::LongOnly);
        assert_eq!(config.strategy.profit_trigger_points, 5.0);
        assert_eq!(config.broker.latency_ms, 400);
        assert_eq!(config.broker.jitter_ms, 100);
        assert!(config.broker.stale_echo);
        assert!(config.window.is_some());
        assert_eq!(config.recent_trades, 10);
    }

    #[test]
    fn test_minimal_session_uses_defaults() {
        let config = SessionConfig::from_toml_str("name = \"a\"\nsymbol = \"NQ\"").unwrap();
        assert_eq!(config.strategy, StrategyConfig::default());
        assert!(config.window.is_none());
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let err = SessionConfig::from_toml_str(
            "name = \"a\"\nsymbol = \"NQ\"\n[strategy]\nprogressive_tightening_rate = 0.9",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Strategy(_)));
    }

    #[test]
    fn test_negative_latency_is_rejected() {
        let mut config = SessionConfig::new("a", "ES");
        config.broker.latency_ms = -1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = SessionConfig::from_toml_str(SAMPLE).unwrap();
        let id1 = config.run_id();
        let id2 = config.run_id();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let config1 = SessionConfig::new("a", "ES");
        let mut config2 = config1.clone();
        config2.strategy.atr_multiplier = 3.0;
        assert_ne!(config1.run_id(), config2.run_id());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionConfig::load(Path::new("/nonexistent/session.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
