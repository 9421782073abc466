//! Position reconciliation between the local and the reported view.
//!
//! `local` is asserted optimistically the instant an entry or exit is
//! accepted. `reported` mirrors the asynchronous broker feed. The two are
//! merged here and nowhere else.
//!
//! # Debounce
//! A report that matches a local assertion made less than the debounce
//! window ago is treated as the echo of that assertion and does not touch
//! `local`. Any report that contradicts `local` resynchronizes it, and a flat
//! report always wins. Timestamps are supplied by the caller; the reconciler
//! never reads a clock.
//!
//! # Self-healing
//! Before an entry is evaluated inside the trading window, a stale open
//! `local` facing a flat `reported` is forced flat so a lost report can never
//! block entries forever. Outside the window nothing is healed.

pub mod agreement;

pub use agreement::{check_agreement, Agreement, Divergence};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DirectionMode;
use crate::domain::{PositionSide, PositionView, Side};
use crate::error::Rejection;

/// An accepted entry or exit: the side and contracts to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub side: Side,
    pub quantity: u32,
}

/// What an external report did to the local view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportOutcome {
    /// Matched a fresh local assertion; local left untouched.
    Debounced,
    /// Already matched; local timestamp refreshed.
    InSync,
    /// Local was overwritten with the reported position.
    Corrected { from: PositionSide, to: PositionSide },
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    local: PositionView,
    reported: PositionView,
    direction: DirectionMode,
    debounce: Duration,
    forced_resyncs: usize,
}

impl Reconciler {
    /// Both views start flat at `started_at`.
    pub fn new(direction: DirectionMode, debounce: Duration, started_at: DateTime<Utc>) -> Self {
        Self {
            local: PositionView::flat(started_at),
            reported: PositionView::flat(started_at),
            direction,
            debounce,
            forced_resyncs: 0,
        }
    }

    pub fn local(&self) -> &PositionView {
        &self.local
    }

    pub fn reported(&self) -> &PositionView {
        &self.reported
    }

    pub fn agreement(&self) -> Agreement {
        check_agreement(&self.local, &self.reported)
    }

    /// Number of times local was forced to match a flat external view.
    pub fn forced_resyncs(&self) -> usize {
        self.forced_resyncs
    }

    /// True if either view shows `side` open.
    pub fn holds(&self, side: Side) -> bool {
        self.local.holds(side) || self.reported.holds(side)
    }

    fn is_recent(&self, now: DateTime<Utc>) -> bool {
        now - self.local.last_update < self.debounce
    }

    /// Force a stale open local view flat when the external view is flat.
    ///
    /// Returns true if a correction happened.
    pub fn heal(&mut self, now: DateTime<Utc>) -> bool {
        if !self.reported.is_flat() || self.local.is_flat() || self.is_recent(now) {
            return false;
        }
        warn!(
            local = %self.local,
            "forcing sync: external view is flat, correcting local tracking"
        );
        self.local = PositionView::flat(now);
        self.forced_resyncs += 1;
        true
    }

    /// Decide whether a new entry may be issued.
    ///
    /// On acceptance `local` is set to the new position immediately.
    pub fn propose_entry(
        &mut self,
        side: Side,
        quantity: u32,
        now: DateTime<Utc>,
        window_open: bool,
    ) -> Result<Accepted, Rejection> {
        // Outside the window no entry logic runs at all, healing included.
        if !window_open {
            return Err(Rejection::WindowClosed);
        }
        self.heal(now);

        match self.agreement() {
            Agreement::Agree if self.local.is_flat() => {}
            Agreement::Agree | Agreement::Disagree(Divergence::LocalAhead) => {
                return Err(Rejection::NotFlat)
            }
            Agreement::Disagree(divergence) => {
                debug!(?divergence, local = %self.local, reported = %self.reported, "entry blocked");
                return Err(Rejection::NotSynchronized);
            }
        }
        if !self.direction.permits(side) {
            return Err(Rejection::DirectionDisallowed);
        }
        if quantity == 0 {
            return Err(Rejection::ZeroQuantity);
        }

        self.local = PositionView::open(side, quantity, now);
        info!(%side, quantity, "entry accepted, local tracking updated");
        Ok(Accepted { side, quantity })
    }

    /// Decide whether an exit may be issued.
    ///
    /// Either view holding `side` is enough: a redundant exit is cheaper than
    /// a missed one. On acceptance `local` goes flat immediately.
    pub fn propose_exit(&mut self, side: Side, now: DateTime<Utc>) -> Result<Accepted, Rejection> {
        if !self.holds(side) {
            return Err(Rejection::NoOpenPosition);
        }
        let quantity = [&self.local, &self.reported]
            .iter()
            .filter(|view| view.holds(side))
            .map(|view| view.quantity)
            .max()
            .unwrap_or(0);
        info!(
            %side,
            quantity,
            local = %self.local,
            reported = %self.reported,
            "exit accepted, local tracking set flat"
        );
        self.local = PositionView::flat(now);
        Ok(Accepted { side, quantity })
    }

    /// Apply an asynchronous position report from the external feed.
    pub fn on_external_report(
        &mut self,
        side: PositionSide,
        quantity: u32,
        timestamp: DateTime<Utc>,
    ) -> ReportOutcome {
        let incoming = PositionView::new(side, quantity, timestamp);
        self.reported = incoming.clone();

        if self.local.same_position(&incoming) {
            if self.is_recent(timestamp) {
                debug!(reported = %incoming, "report skipped: local already correct and recently updated");
                return ReportOutcome::Debounced;
            }
            self.local.last_update = timestamp;
            return ReportOutcome::InSync;
        }

        let from = self.local.side;
        if incoming.is_flat() {
            warn!(local = %self.local, "external view is flat, local tracking corrected");
            self.forced_resyncs += 1;
        } else {
            info!(local = %self.local, reported = %incoming, "local tracking resynchronized");
        }
        self.local = incoming;
        ReportOutcome::Corrected {
            from,
            to: self.local.side,
        }
    }
}
