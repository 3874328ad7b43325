//! Domain types for revlab

pub mod bar;
pub mod event;
pub mod label;
pub mod row;

pub use bar::Bar;
pub use event::{Direction, ReversalEvent};
pub use label::{LabeledRow, Target};
pub use row::IndicatorRow;
