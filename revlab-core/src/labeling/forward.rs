//! Forward-outcome labeler.
//!
//! Row `i` is labeled from bars `i+1..=i+HORIZON` only. Rows closer than
//! `HORIZON` bars to the end of the series are never labeled.

use serde::{Deserialize, Serialize};

use crate::domain::{IndicatorRow, LabeledRow, Target};

/// Number of future bars inspected for each label.
pub const HORIZON: usize = 3;

/// Threshold rule deciding whether the forward window is a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Hit when `max(high[i+1..=i+3]) - close[i] >= k * atr[i]`.
    AtrMultiple { k: f64 },
    /// Hit when `(max(close[i+1..=i+3]) - close[i]) / close[i] >= p`.
    Percent { p: f64 },
}

impl Default for LabelPolicy {
    fn default() -> Self {
        LabelPolicy::AtrMultiple { k: 1.25 }
    }
}

impl LabelPolicy {
    pub fn validate(&self) -> Result<(), String> {
        let (name, value) = match *self {
            LabelPolicy::AtrMultiple { k } => ("k", k),
            LabelPolicy::Percent { p } => ("p", p),
        };
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(format!("label threshold {name} must be positive, got {value}"))
        }
    }

    /// Label for row `i`, or `None` when the row is out of range or the
    /// policy cannot be evaluated there.
    fn label(&self, rows: &[IndicatorRow], i: usize) -> Option<Target> {
        let window = rows.get(i + 1..=i + HORIZON)?;
        let close = rows[i].close();

        let hit = match *self {
            LabelPolicy::AtrMultiple { k } => {
                let atr = rows[i].atr.filter(|&atr| atr != 0.0)?;
                let max_high = window.iter().map(|r| r.bar.high).fold(f64::NEG_INFINITY, f64::max);
                max_high - close >= k * atr
            }
            LabelPolicy::Percent { p } => {
                let max_close = window.iter().map(|r| r.close()).fold(f64::NEG_INFINITY, f64::max);
                (max_close - close) / close >= p
            }
        };
        Some(Target::from(hit))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForwardLabeler {
    policy: LabelPolicy,
}

impl ForwardLabeler {
    pub fn new(policy: LabelPolicy) -> Self {
        Self { policy }
    }

    /// One entry per row; `None` for rows that receive no label.
    pub fn targets(&self, rows: &[IndicatorRow]) -> Vec<Option<Target>> {
        (0..rows.len()).map(|i| self.policy.label(rows, i)).collect()
    }

    /// Training rows for every labeled index whose features are all defined.
    pub fn labeled_rows(&self, rows: &[IndicatorRow], symbol: &str) -> Vec<LabeledRow> {
        rows.iter()
            .zip(self.targets(rows))
            .filter_map(|(row, target)| {
                Some(LabeledRow {
                    date: row.bar.date,
                    symbol: symbol.to_string(),
                    rsi: row.rsi?,
                    macd_diff: row.macd_diff?,
                    volume: row.bar.volume,
                    atr: row.atr?,
                    prev_change: row.prev_change?,
                    target: target?,
                })
            })
            .collect()
    }
}
