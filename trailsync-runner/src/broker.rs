//! Deterministic paper broker.
//!
//! Turns order intents into delayed execution and position callbacks, the way
//! a live connection would deliver them: asynchronously, after a latency, and
//! in timestamp order. All randomness comes from a seeded RNG so a session
//! replays identically.
//!
//! The broker holds the true position. Intents that do not fit it (an entry
//! while already positioned, an exit of a side not held) are dropped, just as
//! a real account would reject or no-op them.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trailsync_core::domain::{Fill, PositionSide};
use trailsync_core::strategy::OrderIntent;

use crate::config::BrokerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrokerEventKind {
    Execution(Fill),
    Position { side: PositionSide, quantity: u32 },
}

/// A callback scheduled for delivery at `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerEvent {
    pub at: DateTime<Utc>,
    pub kind: BrokerEventKind,
}

pub struct PaperBroker {
    config: BrokerConfig,
    rng: StdRng,
    side: PositionSide,
    quantity: u32,
    /// Sorted by `at`; ties keep scheduling order.
    scheduled: Vec<BrokerEvent>,
    dropped: usize,
}

impl PaperBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            side: PositionSide::Flat,
            quantity: 0,
            scheduled: Vec::new(),
            dropped: 0,
        }
    }

    /// The broker's own (true) position.
    pub fn position(&self) -> (PositionSide, u32) {
        (self.side, self.quantity)
    }

    /// Intents that did not fit the true position.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Accept an intent issued at `at`, filling at `price`.
    ///
    /// Returns false if the intent was dropped.
    pub fn submit(&mut self, intent: &OrderIntent, price: f64, at: DateTime<Utc>) -> bool {
        let (fill, side, quantity) = match *intent {
            OrderIntent::Enter { side, quantity } => {
                if !self.side.is_flat() {
                    return self.drop_intent(intent);
                }
                (Fill::entry(side, price, quantity, at), PositionSide::from(side), quantity)
            }
            OrderIntent::Exit { side, .. } => {
                if self.side != PositionSide::from(side) {
                    return self.drop_intent(intent);
                }
                (
                    Fill::exit(side, price, self.quantity, at),
                    PositionSide::Flat,
                    0,
                )
            }
        };

        let fill_at = at + self.latency();
        if self.config.stale_echo {
            self.schedule(BrokerEvent {
                at: at + Duration::milliseconds(self.config.latency_ms / 2),
                kind: BrokerEventKind::Position {
                    side: self.side,
                    quantity: self.quantity,
                },
            });
        }
        self.schedule(BrokerEvent {
            at: fill_at,
            kind: BrokerEventKind::Execution(Fill {
                timestamp: fill_at,
                ..fill
            }),
        });
        self.schedule(BrokerEvent {
            at: fill_at + Duration::milliseconds(self.config.report_delay_ms),
            kind: BrokerEventKind::Position { side, quantity },
        });

        self.side = side;
        self.quantity = quantity;
        true
    }

    /// Remove and return every event due at or before `until`.
    pub fn drain_until(&mut self, until: DateTime<Utc>) -> Vec<BrokerEvent> {
        let due = self.scheduled.partition_point(|e| e.at <= until);
        self.scheduled.drain(..due).collect()
    }

    /// Remove and return everything still scheduled.
    pub fn drain_all(&mut self) -> Vec<BrokerEvent> {
        std::mem::take(&mut self.scheduled)
    }

    fn latency(&mut self) -> Duration {
        let jitter = if self.config.jitter_ms > 0 {
            self.rng.gen_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        Duration::milliseconds(self.config.latency_ms + jitter)
    }

    fn schedule(&mut self, event: BrokerEvent) {
        let idx = self.scheduled.partition_point(|e| e.at <= event.at);
        self.scheduled.insert(idx, event);
    }

    fn drop_intent(&mut self, intent: &OrderIntent) -> bool {
        debug!(?intent, position = ?self.side, "paper broker dropped intent");
        self.dropped += 1;
        false
    }
}
