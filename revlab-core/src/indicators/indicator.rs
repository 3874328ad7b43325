//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, aligned series out.
//! Values before the lookback is satisfied are `None`, never a sentinel.

use crate::domain::Bar;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bar t+1 or later. Every indicator must
/// pass the truncated-vs-full series test in `tests/lookahead_test.rs`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars whose value is `None`.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series in a single pass.
    ///
    /// Returns a `Vec` of the same length as `bars`; the first `lookback()`
    /// entries are `None`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}
