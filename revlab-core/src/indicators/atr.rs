//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing: seed = mean of the first `period` true ranges,
//! then ATR[t] = (ATR[t-1] * (period-1) + TR[t]) / period.
//! Bar 0 has no previous close, so the first true range is at bar 1.
//! Lookback: period.

use super::indicator::Indicator;
use crate::domain::Bar;

/// Streaming Wilder smoother. Shared by ATR and RSI.
#[derive(Debug, Clone)]
pub struct WilderState {
    period: usize,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl WilderState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Wilder period must be >= 1");
        Self {
            period,
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Feed the next value; returns the smoothed value once `period` values
    /// have been seen.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        self.seen += 1;
        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + x) / n),
            None => {
                self.seed_sum += x;
                if self.seen == self.period {
                    Some(self.seed_sum / n)
                } else {
                    None
                }
            }
        };
        self.value
    }
}

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut result = vec![None; bars.len()];
        let mut wilder = WilderState::new(self.period);
        for (i, pair) in bars.windows(2).enumerate() {
            result[i + 1] = wilder.update(true_range(&pair[1], pair[0].close));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, current bar 108-115
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, 15, 8) = 15
        ]);
        assert_approx(true_range(&bars[1], bars[0].close), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // no TR
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).compute(&bars);

        assert!(result[..3].iter().all(Option::is_none));
        // Seed: mean(8, 9, 6) = 23/3; next: (23/3 * 2 + 6) / 3 = 64/9
        assert_approx(result[3].unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4].unwrap(), 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_flat_series_is_zero() {
        let bars = make_ohlc_bars(&[(50.0, 50.0, 50.0, 50.0); 6]);
        let result = Atr::new(3).compute(&bars);
        assert_eq!(result[3], Some(0.0));
        assert_eq!(result[5], Some(0.0));
    }

    #[test]
    fn wilder_matches_recurrence() {
        let mut w = WilderState::new(2);
        assert_eq!(w.update(4.0), None);
        assert_eq!(w.update(6.0), Some(5.0));
        assert_eq!(w.update(9.0), Some(7.0));
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
