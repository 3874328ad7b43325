//! Training rows produced by the forward-outcome labeler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Binary forward outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Miss,
    Hit,
}

impl Target {
    pub fn as_u8(self) -> u8 {
        match self {
            Target::Miss => 0,
            Target::Hit => 1,
        }
    }
}

impl From<bool> for Target {
    fn from(hit: bool) -> Self {
        if hit {
            Target::Hit
        } else {
            Target::Miss
        }
    }
}

/// One row of the training table. Every feature is defined by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub rsi: f64,
    pub macd_diff: f64,
    pub volume: u64,
    pub atr: f64,
    pub prev_change: f64,
    pub target: Target,
}
