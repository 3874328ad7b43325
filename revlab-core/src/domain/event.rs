//! Reversal events emitted by the detector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a detected reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// Event-table `Target` value: 1 for bullish, 0 for bearish.
    pub fn target(self) -> u8 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => 0,
        }
    }

    /// Option-type suffix of the synthetic contract label.
    pub fn option_kind(self) -> &'static str {
        match self {
            Direction::Bullish => "CE",
            Direction::Bearish => "PE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => f.write_str("Bullish"),
            Direction::Bearish => f.write_str("Bearish"),
        }
    }
}

/// An immutable reversal event at `bar_index`.
///
/// `stop_loss` and `target_price` are already rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalEvent {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_price: f64,
    pub strike: i64,
    /// e.g. `"RELIANCE 2950 CE"`.
    pub synthetic_label: String,
}
