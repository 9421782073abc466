//! Trailsync Runner: session replay, paper broker, sweeps, artifacts.
//!
//! This crate builds on `trailsync-core` to provide:
//! - Session configuration (TOML) with content-addressed run ids
//! - Bar loading from CSV
//! - A deterministic paper broker that delivers delayed fills and position reports
//! - Single-session replay with trading window gating
//! - Parameter sweeps over the stop settings
//! - JSON and CSV artifact export

pub mod broker;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod window;

pub use broker::{BrokerEvent, BrokerEventKind, PaperBroker};
pub use config::{BrokerConfig, ConfigError, RunId, SessionConfig};
pub use data_loader::{load_bars, read_bars, LoadError};
pub use export::{export_json, export_trades_csv, import_json, load_artifacts, save_artifacts};
pub use metrics::PerformanceSummary;
pub use runner::{
    run_session, run_session_from_file, ReportCounts, RunError, SessionResult, StopPoint,
    SCHEMA_VERSION,
};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
pub use window::TradingWindow;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn session_result_is_send_sync() {
        assert_send::<SessionResult>();
        assert_sync::<SessionResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SessionConfig>();
        assert_sync::<SessionConfig>();
        assert_send::<BrokerConfig>();
        assert_sync::<BrokerConfig>();
        assert_send::<TradingWindow>();
        assert_sync::<TradingWindow>();
    }

    #[test]
    fn performance_summary_is_send_sync() {
        assert_send::<PerformanceSummary>();
        assert_sync::<PerformanceSummary>();
    }

    #[test]
    fn paper_broker_is_send() {
        assert_send::<PaperBroker>();
    }

    #[test]
    fn param_grid_is_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }
}
