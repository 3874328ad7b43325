//! Concrete indicator implementations.
//!
//! Every indicator implements the `Indicator` trait and is computed in one
//! forward pass over the bar series. Multi-series indicators (Bollinger, MACD)
//! also expose a function returning all of their outputs per bar, which is
//! what the precompute stage uses.

pub mod atr;
pub mod bollinger;
pub mod change;
pub mod ema;
pub mod indicator;
pub mod macd;
pub mod rsi;

pub use atr::{true_range, Atr, WilderState};
pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerPoint};
pub use change::PrevChange;
pub use ema::{ema_of_series, Ema, EmaState};
pub use indicator::Indicator;
pub use macd::{Macd, MacdPoint};
pub use rsi::Rsi;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
