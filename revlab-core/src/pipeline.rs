//! Per-symbol pipeline: bars -> indicator rows -> reversal events + labels.
//!
//! A symbol either produces a complete `SeriesOutput` or a `SkipReason`;
//! there is never partial output for a skipped symbol.

use thiserror::Error;

use crate::data::DataError;
use crate::domain::{Bar, IndicatorRow, LabeledRow, ReversalEvent};
use crate::engine::{compute_indicators, IndicatorSettings};
use crate::labeling::{ForwardLabeler, LabelPolicy};
use crate::signals::{ReversalDetector, ReversalSettings};

/// Shortest series the pipeline will process.
pub const MIN_BARS: usize = 30;

/// Why a symbol produced no output.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),

    #[error("no bars returned")]
    Empty,

    #[error("only {bars} bars, need at least {min}")]
    TooShort { bars: usize, min: usize },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("dates not strictly increasing at index {index}")]
    UnorderedDates { index: usize },
}

impl SkipReason {
    /// Short machine-readable tag for manifests and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Fetch(_) => "fetch",
            SkipReason::Empty => "empty",
            SkipReason::TooShort { .. } => "too_short",
            SkipReason::InvalidBar { .. } => "invalid_bar",
            SkipReason::UnorderedDates { .. } => "unordered_dates",
        }
    }
}

/// Every knob of the per-series computation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub indicators: IndicatorSettings,
    pub reversal: ReversalSettings,
    pub labeling: LabelPolicy,
    pub min_bars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorSettings::default(),
            reversal: ReversalSettings::default(),
            labeling: LabelPolicy::default(),
            min_bars: MIN_BARS,
        }
    }
}

/// A reversal event together with the row it fired on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversalRecord {
    pub row: IndicatorRow,
    pub event: ReversalEvent,
    /// RSI change since this symbol's previous event; `None` for the first.
    pub rsi_diff: Option<f64>,
}

/// Everything one symbol contributes to the output tables.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOutput {
    pub symbol: String,
    pub bar_count: usize,
    pub events: Vec<ReversalRecord>,
    pub labels: Vec<LabeledRow>,
}

/// Check length, ordering, and price sanity.
pub fn validate_series(bars: &[Bar], min_bars: usize) -> Result<(), SkipReason> {
    if bars.is_empty() {
        return Err(SkipReason::Empty);
    }
    if bars.len() < min_bars {
        return Err(SkipReason::TooShort {
            bars: bars.len(),
            min: min_bars,
        });
    }
    if let Some(index) = bars.iter().position(|b| !b.is_sane()) {
        return Err(SkipReason::InvalidBar {
            index,
            reason: format!("non-finite or non-positive price on {}", bars[index].date),
        });
    }
    if let Some(offset) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
        return Err(SkipReason::UnorderedDates { index: offset + 1 });
    }
    Ok(())
}

/// Run the full per-symbol computation.
pub fn process_series(
    symbol: &str,
    bars: Vec<Bar>,
    config: &EngineConfig,
) -> Result<SeriesOutput, SkipReason> {
    validate_series(&bars, config.min_bars)?;
    let bar_count = bars.len();

    let rows = compute_indicators(bars, &config.indicators);

    let detector = ReversalDetector::new(config.reversal.clone());
    let mut prev_rsi: Option<f64> = None;
    let events: Vec<ReversalRecord> = detector
        .detect(&rows, symbol)
        .map(|event| {
            let row = rows[event.bar_index].clone();
            let rsi = row.rsi;
            let rsi_diff = prev_rsi.zip(rsi).map(|(prev, curr)| curr - prev);
            prev_rsi = rsi;
            ReversalRecord {
                row,
                event,
                rsi_diff,
            }
        })
        .collect();

    let labels = ForwardLabeler::new(config.labeling).labeled_rows(&rows, symbol);

    tracing::debug!(
        symbol,
        bars = bar_count,
        events = events.len(),
        labels = labels.len(),
        "processed series"
    );

    Ok(SeriesOutput {
        symbol: symbol.to_string(),
        bar_count,
        events,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn oscillating(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 1000.0 + (i as f64 * 0.7).sin() * 60.0 + (i as f64 * 0.13).cos() * 25.0)
            .collect();
        make_bars(&closes)
    }

    #[test]
    fn empty_and_short_series_are_skipped() {
        let cfg = EngineConfig::default();
        assert!(matches!(
            process_series("X", Vec::new(), &cfg),
            Err(SkipReason::Empty)
        ));
        assert!(matches!(
            process_series("X", oscillating(10), &cfg),
            Err(SkipReason::TooShort { bars: 10, min: 30 })
        ));
    }

    #[test]
    fn exactly_min_bars_is_processed() {
        let out = process_series("X", oscillating(30), &EngineConfig::default()).unwrap();
        assert_eq!(out.bar_count, 30);
    }

    #[test]
    fn invalid_and_unordered_bars_are_skipped() {
        let mut bars = oscillating(40);
        bars[5].close = f64::NAN;
        assert!(matches!(
            validate_series(&bars, 30),
            Err(SkipReason::InvalidBar { index: 5, .. })
        ));

        let mut bars = oscillating(40);
        bars[7].date = bars[6].date;
        assert!(matches!(
            validate_series(&bars, 30),
            Err(SkipReason::UnorderedDates { index: 7 })
        ));
    }

    /// Quiet series with a sharp one-bar drop and partial recovery every 40 bars.
    fn shocked(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n)
            .map(|i| match i % 40 {
                0 if i > 0 => 900.0,
                1 if i > 1 => 920.0,
                _ => 1000.0 + (i as f64 * 0.5).sin() * 2.0,
            })
            .collect();
        make_bars(&closes)
    }

    #[test]
    fn rsi_diff_chains_events() {
        let out = process_series("X", shocked(200), &EngineConfig::default()).unwrap();
        let bullish: Vec<usize> = out
            .events
            .iter()
            .filter(|r| r.event.direction == crate::domain::Direction::Bullish)
            .map(|r| r.event.bar_index)
            .collect();
        for index in [41, 81, 121, 161] {
            assert!(bullish.contains(&index), "missing reversal at {index}");
        }

        assert!(out.events[0].rsi_diff.is_none());
        for pair in out.events.windows(2) {
            let expected = pair[1].row.rsi.unwrap() - pair[0].row.rsi.unwrap();
            assert_eq!(pair[1].rsi_diff, Some(expected));
        }
    }

    #[test]
    fn event_rows_match_event_index() {
        let out = process_series("X", shocked(200), &EngineConfig::default()).unwrap();
        assert!(!out.events.is_empty());
        for record in &out.events {
            assert_eq!(record.row.bar.date, record.event.date);
            assert_eq!(record.row.close(), record.event.entry_price);
        }
    }

    #[test]
    fn skip_reason_kinds() {
        assert_eq!(SkipReason::Empty.kind(), "empty");
        assert_eq!(
            SkipReason::TooShort { bars: 1, min: 30 }.to_string(),
            "only 1 bars, need at least 30"
        );
    }
}
