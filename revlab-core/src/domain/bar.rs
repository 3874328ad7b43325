//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for one symbol.
///
/// Bars carry no symbol of their own: a series is always owned by the
/// symbol it was fetched for, and every derived row keeps index alignment
/// with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: finite, strictly positive prices.
    ///
    /// High/low ordering is deliberately not enforced: vendors occasionally
    /// publish a close a tick outside the day's range and the indicators are
    /// well defined either way.
    pub fn is_sane(&self) -> bool {
        !self.is_void()
            && self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
    }
}
