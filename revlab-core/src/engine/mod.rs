//! Indicator computation stage.
//!
//! Consumes a validated bar series and produces index-aligned indicator rows
//! for the detector and labeler.

pub mod precompute;

pub use precompute::{compute_indicators, IndicatorSettings};
