//! Previous-bar percentage change.
//!
//! value[t] = (close[t-1] - close[t-2]) / close[t-2] * 100
//! Lagged by one bar on purpose: row t only carries the move that was known
//! when bar t opened.
//! Lookback: 2.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct PrevChange;

impl PrevChange {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for PrevChange {
    fn name(&self) -> &str {
        "prev_change"
    }

    fn lookback(&self) -> usize {
        2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut result = vec![None; bars.len()];
        for (i, pair) in bars.windows(2).enumerate() {
            // pair = (t-2, t-1), written at t
            if let Some(slot) = result.get_mut(i + 2) {
                *slot = Some((pair[1].close - pair[0].close) / pair[0].close * 100.0);
            }
        }
        result
    }
}
