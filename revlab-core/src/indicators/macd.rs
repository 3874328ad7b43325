//! Moving Average Convergence Divergence (MACD).
//!
//! line = EMA(close, fast) - EMA(close, slow)
//! signal = EMA(line, signal)
//! histogram ("diff") = line - signal
//! Lookback: slow - 1 + signal - 1 (33 for 12/26/9).

use super::ema::{ema_of_series, EmaState};
use super::indicator::Indicator;
use crate::domain::Bar;

/// All MACD outputs for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_diff_{fast}_{slow}_{signal}"),
        }
    }

    /// Standard 12/26/9 parameters.
    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }

    /// MACD line, signal line and histogram for every bar.
    pub fn points(&self, bars: &[Bar]) -> Vec<Option<MacdPoint>> {
        let mut fast = EmaState::new(self.fast);
        let mut slow = EmaState::new(self.slow);
        let line: Vec<Option<f64>> = bars
            .iter()
            .map(|bar| {
                let f = fast.update(bar.close);
                let s = slow.update(bar.close);
                f.zip(s).map(|(f, s)| f - s)
            })
            .collect();

        let signal = ema_of_series(&line, self.signal);
        line.iter()
            .zip(&signal)
            .map(|(line, signal)| {
                line.zip(*signal).map(|(line, signal)| MacdPoint {
                    line,
                    signal,
                    histogram: line - signal,
                })
            })
            .collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        self.points(bars)
            .into_iter()
            .map(|p| p.map(|p| p.histogram))
            .collect()
    }
}
