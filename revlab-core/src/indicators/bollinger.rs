//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//! - Bandwidth: upper - lower
//!
//! Uses population stddev (divide by N), maintained with a sliding Welford
//! update so each bar costs O(1) regardless of the window length. A window
//! of identical closes resets the state to mean = close and sigma = 0 so
//! accumulated rounding never leaves a flat close outside its own bands.
//! Lookback: period - 1.

use super::indicator::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to expose through `Indicator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    Bandwidth,
}

/// All band values for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

impl BollingerPoint {
    pub fn bandwidth(&self) -> f64 {
        self.upper - self.lower
    }

    fn band(&self, band: BollingerBand) -> f64 {
        match band {
            BollingerBand::Upper => self.upper,
            BollingerBand::Middle => self.middle,
            BollingerBand::Lower => self.lower,
            BollingerBand::Bandwidth => self.bandwidth(),
        }
    }
}

/// Fixed-size rolling mean/variance.
#[derive(Debug, Clone)]
struct RollingStats {
    window: usize,
    count: usize,
    mean: f64,
    m2: f64,
    /// Length of the current run of identical values, capped at `window`.
    run: usize,
    last: Option<f64>,
}

impl RollingStats {
    fn new(window: usize) -> Self {
        Self {
            window,
            count: 0,
            mean: 0.0,
            m2: 0.0,
            run: 0,
            last: None,
        }
    }

    /// Push `x`; `evicted` is the value leaving the window once it is full.
    fn push(&mut self, x: f64, evicted: Option<f64>) {
        match evicted {
            Some(y) if self.count == self.window => {
                let old_mean = self.mean;
                self.mean += (x - y) / self.window as f64;
                self.m2 += (x - y) * (x - self.mean + y - old_mean);
            }
            _ => {
                self.count += 1;
                let delta = x - self.mean;
                self.mean += delta / self.count as f64;
                self.m2 += delta * (x - self.mean);
            }
        }

        self.run = if self.last == Some(x) {
            (self.run + 1).min(self.window)
        } else {
            1
        };
        self.last = Some(x);
        if self.run == self.window {
            self.mean = x;
            self.m2 = 0.0;
        }
    }

    fn population_stddev(&self) -> f64 {
        (self.m2.max(0.0) / self.count as f64).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand, label: &str) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper, "upper")
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle, "middle")
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower, "lower")
    }

    pub fn bandwidth(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Bandwidth, "bandwidth")
    }
}

/// Compute every band in one pass.
pub fn bollinger_bands(bars: &[Bar], period: usize, multiplier: f64) -> Vec<Option<BollingerPoint>> {
    assert!(period >= 1, "Bollinger period must be >= 1");
    let mut stats = RollingStats::new(period);
    let mut result = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let evicted = i.checked_sub(period).map(|j| bars[j].close);
        stats.push(bar.close, evicted);

        if i + 1 < period {
            result.push(None);
            continue;
        }

        let width = multiplier * stats.population_stddev();
        result.push(Some(BollingerPoint {
            middle: stats.mean,
            upper: stats.mean + width,
            lower: stats.mean - width,
        }));
    }

    result
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        bollinger_bands(bars, self.period, self.multiplier)
            .into_iter()
            .map(|point| point.map(|p| p.band(self.band)))
            .collect()
    }
}
