//! Indicator precomputation.
//!
//! Turns a bar series into index-aligned `IndicatorRow`s. Every indicator is
//! a single forward pass, so the whole stage is O(N) per symbol.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, IndicatorRow};
use crate::indicators::{bollinger_bands, Atr, Indicator, Macd, PrevChange, Rsi};

/// Indicator parameters. Defaults are the standard 20/2, 14, 12/26/9, 14.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub bb_window: usize,
    pub bb_stddev_mult: f64,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            bb_window: 20,
            bb_stddev_mult: 2.0,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
        }
    }
}

impl IndicatorSettings {
    /// Validate parameter ranges. Returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.bb_window == 0 || self.rsi_period == 0 || self.atr_period == 0 {
            return Err("indicator periods must be >= 1".into());
        }
        if self.macd_fast == 0 || self.macd_signal == 0 || self.macd_fast >= self.macd_slow {
            return Err(format!(
                "invalid MACD periods {}/{}/{}",
                self.macd_fast, self.macd_slow, self.macd_signal
            ));
        }
        if !(self.bb_stddev_mult.is_finite() && self.bb_stddev_mult > 0.0) {
            return Err(format!(
                "bb_stddev_mult must be positive, got {}",
                self.bb_stddev_mult
            ));
        }
        Ok(())
    }

    /// Longest lookback across all indicators.
    pub fn warmup(&self) -> usize {
        [
            self.bb_window.saturating_sub(1),
            self.rsi_period,
            self.atr_period,
            self.macd_slow + self.macd_signal - 2,
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Compute every indicator column for one symbol's bars.
///
/// Consumes the bars and returns exactly one row per bar, in the same order.
pub fn compute_indicators(bars: Vec<Bar>, settings: &IndicatorSettings) -> Vec<IndicatorRow> {
    let bands = bollinger_bands(&bars, settings.bb_window, settings.bb_stddev_mult);
    let rsi = Rsi::new(settings.rsi_period).compute(&bars);
    let macd = Macd::new(settings.macd_fast, settings.macd_slow, settings.macd_signal).compute(&bars);
    let atr = Atr::new(settings.atr_period).compute(&bars);
    let prev_change = PrevChange::new().compute(&bars);

    debug_assert!(
        [rsi.len(), macd.len(), atr.len(), prev_change.len(), bands.len()]
            .iter()
            .all(|&n| n == bars.len()),
        "indicator series length mismatch"
    );

    bars.into_iter()
        .enumerate()
        .map(|(i, bar)| {
            let band = bands[i];
            IndicatorRow {
                bar,
                bb_middle: band.map(|b| b.middle),
                bb_upper: band.map(|b| b.upper),
                bb_lower: band.map(|b| b.lower),
                bb_bandwidth: band.map(|b| b.bandwidth()),
                rsi: rsi[i],
                macd_diff: macd[i],
                atr: atr[i],
                prev_change: prev_change[i],
            }
        })
        .collect()
}
