//! Trailsync Core: position reconciliation, adaptive trailing stop, execution ledger.
//!
//! This crate contains the decision engine of a single-instrument strategy:
//! - Domain types (bars, indicator inputs, position views, fills, trades)
//! - Reconciler merging the locally asserted and externally reported position
//! - Stop engine with breakeven, progressive tightening and a volatility floor
//! - Execution ledger pairing fills into trades with running statistics
//! - Strategy loop owning one instance of each per strategy context
//!
//! Nothing here performs I/O or reads a clock; every timestamp is supplied by
//! the caller.

pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod signal;
pub mod stop;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: strategy state can move to a worker thread.
    ///
    /// The runner replays independent contexts in parallel; if any type fails
    /// this check, the build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarInput>();
        require_sync::<domain::BarInput>();
        require_send::<domain::PositionView>();
        require_sync::<domain::PositionView>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        // Components
        require_send::<reconcile::Reconciler>();
        require_sync::<reconcile::Reconciler>();
        require_send::<stop::StopEngine>();
        require_sync::<stop::StopEngine>();
        require_send::<ledger::ExecutionLedger>();
        require_sync::<ledger::ExecutionLedger>();

        // Strategy
        require_send::<strategy::StrategyContext>();
        require_sync::<strategy::StrategyContext>();
        require_send::<strategy::BarOutcome>();
        require_sync::<strategy::BarOutcome>();
        require_send::<config::StrategyConfig>();
        require_sync::<config::StrategyConfig>();
    }

    /// Compile-time check: the stop engine never sees the position views.
    ///
    /// `update` takes a bar and a volatility distance only. Position state
    /// reaches it through `init`/`teardown` driven by the strategy loop.
    #[allow(dead_code)]
    fn stop_update_signature(engine: &mut stop::StopEngine, bar: &domain::Bar) -> stop::StopStatus {
        engine.update(bar, 1.0)
    }
}
