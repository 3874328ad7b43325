//! Bollinger reversal detector.
//!
//! Compares row `i-1` with row `i`:
//! - Bullish: prior close below the prior lower band, close rising, RSI rising.
//! - Bearish: prior close above the prior upper band, close falling, RSI falling.
//!
//! Bullish is evaluated first. Index 0 never emits.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, IndicatorRow, ReversalEvent};

/// Stop/target distances and strike grid for reversal events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalSettings {
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
    pub strike_step: f64,
}

impl Default for ReversalSettings {
    fn default() -> Self {
        Self {
            stop_atr_mult: 0.3,
            target_atr_mult: 0.9,
            strike_step: 50.0,
        }
    }
}

impl ReversalSettings {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("stop_atr_mult", self.stop_atr_mult),
            ("target_atr_mult", self.target_atr_mult),
            ("strike_step", self.strike_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        // Strikes are whole rupees; a fractional step would leave the grid.
        if self.strike_step.fract() != 0.0 {
            return Err(format!(
                "strike_step must be a whole number, got {}",
                self.strike_step
            ));
        }
        Ok(())
    }
}

/// Round to two decimals, ties to even.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Nearest multiple of `step` to `close` (ties to even), shifted one step
/// out of the money for `direction`.
pub fn synthetic_strike(close: f64, step: f64, direction: Direction) -> i64 {
    let atm = (close / step).round_ties_even() * step;
    let strike = match direction {
        Direction::Bullish => atm + step,
        Direction::Bearish => atm - step,
    };
    strike.round() as i64
}

#[derive(Debug, Clone, Default)]
pub struct ReversalDetector {
    settings: ReversalSettings,
}

impl ReversalDetector {
    pub fn new(settings: ReversalSettings) -> Self {
        Self { settings }
    }

    /// Evaluate the transition into `bar_index`.
    ///
    /// Returns `None` at index 0, past the end, or when any required value
    /// on either row is undefined.
    pub fn evaluate(
        &self,
        rows: &[IndicatorRow],
        bar_index: usize,
        symbol: &str,
    ) -> Option<ReversalEvent> {
        if bar_index == 0 {
            return None;
        }
        let prev = rows.get(bar_index - 1)?;
        let curr = rows.get(bar_index)?;

        let prev_rsi = prev.rsi?;
        let curr_rsi = curr.rsi?;
        let prev_lower = prev.bb_lower?;
        let prev_upper = prev.bb_upper?;
        let atr = curr.atr?;
        let (prev_close, close) = (prev.close(), curr.close());

        let direction = if prev_close < prev_lower && close > prev_close && curr_rsi > prev_rsi {
            Direction::Bullish
        } else if prev_close > prev_upper && close < prev_close && curr_rsi < prev_rsi {
            Direction::Bearish
        } else {
            return None;
        };

        let stop_distance = self.settings.stop_atr_mult * atr;
        let target_distance = self.settings.target_atr_mult * atr;
        let (stop_loss, target_price) = match direction {
            Direction::Bullish => (close - stop_distance, close + target_distance),
            Direction::Bearish => (close + stop_distance, close - target_distance),
        };

        let strike = synthetic_strike(close, self.settings.strike_step, direction);
        Some(ReversalEvent {
            bar_index,
            date: curr.bar.date,
            symbol: symbol.to_string(),
            direction,
            entry_price: close,
            stop_loss: round_price(stop_loss),
            target_price: round_price(target_price),
            strike,
            synthetic_label: format!("{symbol} {strike} {}", direction.option_kind()),
        })
    }

    /// Lazily scan every index in chronological order.
    pub fn detect<'a>(
        &'a self,
        rows: &'a [IndicatorRow],
        symbol: &'a str,
    ) -> impl Iterator<Item = ReversalEvent> + 'a {
        (1..rows.len()).filter_map(move |i| self.evaluate(rows, i, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn row(day: u32, close: f64, rsi: f64, lower: f64, upper: f64, atr: f64) -> IndicatorRow {
        let mut row = IndicatorRow::bare(Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 5000,
        });
        row.rsi = Some(rsi);
        row.bb_lower = Some(lower);
        row.bb_upper = Some(upper);
        row.atr = Some(atr);
        row
    }

    #[test]
    fn bullish_reversal() {
        let rows = vec![
            row(1, 2890.0, 25.0, 2900.0, 3000.0, 40.0),
            row(2, 2910.0, 30.0, 2895.0, 2995.0, 40.0),
        ];
        let event = ReversalDetector::default().evaluate(&rows, 1, "RELIANCE").unwrap();

        assert_eq!(event.direction, Direction::Bullish);
        assert_eq!(event.entry_price, 2910.0);
        assert_eq!(event.stop_loss, 2898.0);
        assert_eq!(event.target_price, 2946.0);
        assert_eq!(event.strike, 2950);
        assert_eq!(event.synthetic_label, "RELIANCE 2950 CE");
        assert!(event.stop_loss < event.entry_price && event.entry_price < event.target_price);
    }

    #[test]
    fn bearish_reversal() {
        let rows = vec![
            row(1, 1510.0, 75.0, 1400.0, 1500.0, 20.0),
            row(2, 1490.0, 70.0, 1405.0, 1505.0, 20.0),
        ];
        let event = ReversalDetector::default().evaluate(&rows, 1, "TCS").unwrap();

        assert_eq!(event.direction, Direction::Bearish);
        assert_eq!(event.stop_loss, 1496.0);
        assert_eq!(event.target_price, 1472.0);
        assert_eq!(event.strike, 1450);
        assert_eq!(event.synthetic_label, "TCS 1450 PE");
    }

    #[test]
    fn no_event_at_index_zero() {
        let rows = vec![row(1, 10.0, 50.0, 20.0, 30.0, 1.0)];
        assert!(ReversalDetector::default().evaluate(&rows, 0, "X").is_none());
        assert_eq!(ReversalDetector::default().detect(&rows, "X").count(), 0);
    }

    #[test]
    fn rsi_must_confirm() {
        let rows = vec![
            row(1, 2890.0, 30.0, 2900.0, 3000.0, 40.0),
            row(2, 2910.0, 25.0, 2895.0, 2995.0, 40.0),
        ];
        assert!(ReversalDetector::default().evaluate(&rows, 1, "X").is_none());
    }

    #[test]
    fn close_on_band_does_not_trigger() {
        let rows = vec![
            row(1, 100.0, 50.0, 100.0, 100.0, 0.0),
            row(2, 100.0, 50.0, 100.0, 100.0, 0.0),
        ];
        assert!(ReversalDetector::default().evaluate(&rows, 1, "X").is_none());
    }

    #[test]
    fn undefined_inputs_skip() {
        let mut rows = vec![
            row(1, 2890.0, 25.0, 2900.0, 3000.0, 40.0),
            row(2, 2910.0, 30.0, 2895.0, 2995.0, 40.0),
        ];
        rows[1].atr = None;
        assert!(ReversalDetector::default().evaluate(&rows, 1, "X").is_none());

        rows[1].atr = Some(40.0);
        rows[0].bb_upper = None;
        assert!(ReversalDetector::default().evaluate(&rows, 1, "X").is_none());
    }

    #[test]
    fn zero_atr_still_triggers() {
        let rows = vec![
            row(1, 90.0, 20.0, 95.0, 105.0, 0.0),
            row(2, 92.0, 22.0, 94.0, 104.0, 0.0),
        ];
        let event = ReversalDetector::default().evaluate(&rows, 1, "X").unwrap();
        assert_eq!(event.stop_loss, 92.0);
        assert_eq!(event.target_price, 92.0);
    }

    #[test]
    fn bullish_wins_when_both_conditions_hold() {
        // An inverted band lets both breach conditions hold at once.
        let rows = vec![
            row(1, 100.0, 40.0, 110.0, 90.0, 1.0),
            row(2, 101.0, 45.0, 110.0, 90.0, 1.0),
        ];
        let event = ReversalDetector::default().evaluate(&rows, 1, "X").unwrap();
        assert_eq!(event.direction, Direction::Bullish);
    }

    #[test]
    fn strike_ties_round_to_even() {
        // 2925 / 50 = 58.5 rounds to 58, 2975 / 50 = 59.5 rounds to 60
        assert_eq!(synthetic_strike(2925.0, 50.0, Direction::Bullish), 2950);
        assert_eq!(synthetic_strike(2975.0, 50.0, Direction::Bullish), 3050);
        assert_eq!(synthetic_strike(2924.9, 50.0, Direction::Bearish), 2850);
    }

    #[test]
    fn validate_rejects_fractional_strike_step() {
        let mut settings = ReversalSettings::default();
        assert!(settings.validate().is_ok());
        settings.strike_step = 100.0;
        assert!(settings.validate().is_ok());
        settings.strike_step = 2.5;
        let err = settings.validate().unwrap_err();
        assert!(err.contains("whole number"), "{err}");
        settings.strike_step = -50.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn round_price_two_decimals() {
        assert_eq!(round_price(101.23456), 101.23);
        assert_eq!(round_price(-4.0), -4.0);
    }

    #[test]
    fn detect_is_chronological() {
        let rows = vec![
            row(1, 2890.0, 25.0, 2900.0, 3000.0, 40.0),
            row(2, 2910.0, 30.0, 2895.0, 2995.0, 40.0),
            row(3, 3010.0, 75.0, 2900.0, 3000.0, 40.0),
            row(4, 2990.0, 70.0, 2900.0, 3000.0, 40.0),
        ];
        let events: Vec<_> = ReversalDetector::default().detect(&rows, "X").collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].bar_index, 1);
        assert_eq!(events[0].direction, Direction::Bullish);
        assert_eq!(events[1].bar_index, 3);
        assert_eq!(events[1].direction, Direction::Bearish);
    }
}
