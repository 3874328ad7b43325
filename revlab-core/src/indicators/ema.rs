//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1)
//! Seed: EMA[period-1] = SMA of the first `period` values.
//! Lookback: period - 1.

use super::indicator::Indicator;
use crate::domain::Bar;

/// Streaming EMA state, seeded with a simple average.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Feed the next value; returns the EMA once seeded.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        self.seen += 1;
        self.value = match self.value {
            Some(prev) => Some(self.alpha * x + (1.0 - self.alpha) * prev),
            None => {
                self.seed_sum += x;
                if self.seen == self.period {
                    Some(self.seed_sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.value
    }
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut state = EmaState::new(self.period);
        bars.iter().map(|bar| state.update(bar.close)).collect()
    }
}

/// EMA of an arbitrary optional series.
///
/// Leading `None`s are skipped; the seed window starts at the first defined
/// value. A `None` after that point leaves the rest of the output undefined.
/// Used by MACD for the signal line.
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return result;
    };

    let mut state = EmaState::new(period);
    for (i, value) in values.iter().enumerate().skip(start) {
        match value {
            Some(x) => result[i] = state.update(*x),
            None => break,
        }
    }
    result
}
