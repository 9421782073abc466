//! "Do the systems agree" as a pure function over the two position views.

use serde::{Deserialize, Serialize};

use crate::domain::PositionView;

/// How the local and reported views differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Divergence {
    /// Local shows a position the external feed has not confirmed yet.
    LocalAhead,
    /// External feed shows a position local does not know about.
    ReportedAhead,
    /// Both open, on opposite sides.
    SideMismatch,
    /// Same side, different quantity.
    QuantityMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agreement {
    Agree,
    Disagree(Divergence),
}

impl Agreement {
    pub fn is_agreed(&self) -> bool {
        matches!(self, Agreement::Agree)
    }
}

/// Compare side and quantity of the two views; timestamps are ignored.
pub fn check_agreement(local: &PositionView, reported: &PositionView) -> Agreement {
    if local.same_position(reported) {
        return Agreement::Agree;
    }
    let divergence = match (local.is_flat(), reported.is_flat()) {
        (false, true) => Divergence::LocalAhead,
        (true, false) => Divergence::ReportedAhead,
        _ if local.side != reported.side => Divergence::SideMismatch,
        _ => Divergence::QuantityMismatch,
    };
    Agreement::Disagree(divergence)
}
