use tracing::{debug, info, warn};

use crate::domain::{Bar, Side};

use super::{StopParams, StopPhase, StopState, StopStatus, BREAKEVEN_OFFSET_TICKS};

/// Owns the stop state of at most one open position.
#[derive(Debug, Clone)]
pub struct StopEngine {
    params: StopParams,
    state: Option<StopState>,
}

impl StopEngine {
    pub fn new(params: StopParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn params(&self) -> &StopParams {
        &self.params
    }

    /// Start managing a new position. The initial stop sits one full base
    /// distance away from entry and is provisional until the first update.
    ///
    /// Returns false (and leaves the engine untouched) if the entry price or
    /// tick size is not usable.
    pub fn init(&mut self, side: Side, entry_price: f64) -> bool {
        if !entry_price.is_finite() || entry_price <= 0.0 || !self.tick_is_usable() {
            warn!(%side, entry_price, "stop init skipped: invalid entry price or tick size");
            return false;
        }
        if let Some(previous) = &self.state {
            debug!(side = %previous.side(), "replacing stop state that was never torn down");
        }
        let initial_stop =
            entry_price - side.sign() * self.params.base_distance_ticks * self.params.tick_size;
        info!(%side, entry_price, initial_stop, "stop armed");
        self.state = Some(StopState::new(side, entry_price, initial_stop));
        true
    }

    /// Advance the stop by one bar.
    ///
    /// `volatility` is an absolute price distance (ATR-like); it is scaled by
    /// the configured multiplier to form the noise floor.
    pub fn update(&mut self, bar: &Bar, volatility: f64) -> StopStatus {
        let params = self.params;
        let tick_usable = self.tick_is_usable();
        let Some(state) = self.state.as_mut() else {
            return StopStatus::Inactive;
        };

        let inputs_usable = tick_usable
            && state.entry_price > 0.0
            && bar.close.is_finite()
            && bar.low.is_finite()
            && bar.high.is_finite()
            && volatility.is_finite()
            && volatility >= 0.0;
        if !inputs_usable {
            warn!(
                close = bar.close,
                volatility, "stop update skipped: non-finite or non-positive input"
            );
            return StopStatus::Holding(state.stop_price());
        }

        let side = state.side;
        let tick = params.tick_size;
        let profit_ticks = side.favorable_move(state.entry_price, bar.close) / tick;

        // Breakeven jump; takes one full update to settle before trailing resumes.
        if !state.breakeven_activated && profit_ticks >= params.profit_trigger_ticks {
            let level = state.entry_price + side.sign() * BREAKEVEN_OFFSET_TICKS * tick;
            state.ratchet.engage_at(level);
            state.breakeven_activated = true;
            state.phase = StopPhase::BreakevenSet;
            info!(%side, stop = state.stop_price(), profit_ticks, "breakeven protection activated");
            return StopStatus::Holding(state.stop_price());
        }
        if state.phase == StopPhase::BreakevenSet {
            state.phase = StopPhase::Trailing;
        }

        let distance = params.effective_distance(profit_ticks, volatility);
        let candidate = bar.close - side.sign() * distance * tick;
        if state.ratchet.offer(candidate) {
            debug!(%side, stop = candidate, distance_ticks = distance, "stop moved");
        }

        let stop = state.stop_price();
        let adverse = match side {
            Side::Long => bar.low,
            Side::Short => bar.high,
        };
        if side.breaches(adverse, stop) {
            info!(%side, stop, adverse, "stop hit");
            self.state = None;
            return StopStatus::Hit(stop);
        }
        StopStatus::Holding(stop)
    }

    /// Stop managing the position. Returns the final state, if any.
    pub fn teardown(&mut self) -> Option<StopState> {
        let state = self.state.take();
        if let Some(s) = &state {
            debug!(side = %s.side(), stop = s.stop_price(), "stop torn down");
        }
        state
    }

    pub fn state(&self) -> Option<&StopState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.state.as_ref().map(StopState::stop_price)
    }

    fn tick_is_usable(&self) -> bool {
        self.params.tick_size.is_finite() && self.params.tick_size > 0.0
    }
}
