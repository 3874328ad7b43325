//! IndicatorRow: a bar extended with its derived indicator fields.

use serde::{Deserialize, Serialize};

use super::Bar;

/// One bar plus every indicator computed for it.
///
/// Each derived field is `None` until its lookback window is satisfied.
/// Rows are produced one-to-one with input bars, so `rows[i]` always
/// describes `bars[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub bb_middle: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_bandwidth: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_diff: Option<f64>,
    pub atr: Option<f64>,
    pub prev_change: Option<f64>,
}

impl IndicatorRow {
    /// A row with every derived field undefined.
    pub fn bare(bar: Bar) -> Self {
        Self {
            bar,
            bb_middle: None,
            bb_upper: None,
            bb_lower: None,
            bb_bandwidth: None,
            rsi: None,
            macd_diff: None,
            atr: None,
            prev_change: None,
        }
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}
