//! Parameter sweep utilities for grid search over the stop parameters.

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};
use trailsync_core::domain::BarInput;

use crate::config::SessionConfig;
use crate::runner::{run_session, RunError, SessionResult};

/// Parameter grid specification.
///
/// Defines the values to sweep for each stop parameter. Every combination is
/// replayed over the same bars.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub trailing_stop_points: Vec<f64>,
    pub atr_multipliers: Vec<f64>,
    pub profit_trigger_points: Vec<f64>,
    pub tightening_rates: Vec<f64>,
}

impl ParamGrid {
    /// A small grid around the default strategy.
    ///
    /// Trailing: 12, 16, 20, 24 ticks; ATR multiplier: 1.5, 2.5, 3.5;
    /// trigger: 5, 10 ticks; tightening: 0.1, 0.2.
    pub fn stop_default() -> Self {
        Self {
            trailing_stop_points: vec![12.0, 16.0, 20.0, 24.0],
            atr_multipliers: vec![1.5, 2.5, 3.5],
            profit_trigger_points: vec![5.0, 10.0],
            tightening_rates: vec![0.1, 0.2],
        }
    }

    /// Returns the total number of combinations in this grid.
    pub fn size(&self) -> usize {
        self.trailing_stop_points.len()
            * self.atr_multipliers.len()
            * self.profit_trigger_points.len()
            * self.tightening_rates.len()
    }

    /// Generates all valid configurations in the grid.
    ///
    /// Combinations that fail strategy validation are skipped.
    pub fn generate_configs(&self, base_config: &SessionConfig) -> Vec<SessionConfig> {
        let mut configs = Vec::with_capacity(self.size());

        for &trailing in &self.trailing_stop_points {
            for &atr in &self.atr_multipliers {
                for &trigger in &self.profit_trigger_points {
                    for &rate in &self.tightening_rates {
                        let mut config = base_config.clone();
                        config.strategy.trailing_stop_points = trailing;
                        config.strategy.atr_multiplier = atr;
                        config.strategy.profit_trigger_points = trigger;
                        config.strategy.progressive_tightening_rate = rate;
                        config.name = format!(
                            "{}-t{trailing}-a{atr}-p{trigger}-r{rate}",
                            base_config.name
                        );

                        if let Err(e) = config.validate() {
                            debug!(name = %config.name, error = %e, "skipping invalid combination");
                            continue;
                        }
                        configs.push(config);
                    }
                }
            }
        }

        configs
    }
}

/// Parameter sweep executor.
///
/// Replays every configuration in a grid, optionally in parallel. Sessions
/// share nothing, so parallel and sequential sweeps give identical results.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes a parameter sweep over the given grid.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base_config: &SessionConfig,
        bars: &[BarInput],
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base_config);
        info!(combinations = configs.len(), parallel = self.parallel, "sweep started");

        let results: Vec<SessionResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_session(config, bars))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_session(config, bars))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<SessionResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<SessionResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all(&self) -> &[SessionResult] {
        &self.results
    }

    pub fn get(&self, run_id: &str) -> Option<&SessionResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results ordered by total PnL, best first.
    pub fn ranked_by_pnl(&self) -> Vec<&SessionResult> {
        let mut ranked: Vec<&SessionResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| b.summary.total_pnl.total_cmp(&a.summary.total_pnl));
        ranked
    }

    pub fn best(&self) -> Option<&SessionResult> {
        self.ranked_by_pnl().into_iter().next()
    }
}
