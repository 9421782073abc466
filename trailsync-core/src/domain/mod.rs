//! Domain types for TrailSync

pub mod bar;
pub mod fill;
pub mod position;
pub mod side;
pub mod trade;

pub use bar::{Bar, BarInput, IndicatorSnapshot};
pub use fill::{Fill, FillRole};
pub use position::PositionView;
pub use side::{PositionSide, Side};
pub use trade::TradeRecord;
