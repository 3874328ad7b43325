//! Ordered reduction of per-symbol outcomes into the two output tables.

use std::cmp::Ordering;

use revlab_core::domain::LabeledRow;
use revlab_core::ReversalRecord;

use crate::batch::SymbolOutcome;

/// The concatenated reversal-event and training tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub reversals: Vec<ReversalRecord>,
    pub training: Vec<LabeledRow>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.reversals.is_empty() && self.training.is_empty()
    }
}

/// Concatenate processed symbols in input order.
///
/// A symbol's training rows are kept only if it has at least
/// `min_labeled_rows` of them.
pub fn assemble(outcomes: &[SymbolOutcome], min_labeled_rows: usize) -> Dataset {
    let mut dataset = Dataset::default();
    for out in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        dataset.reversals.extend(out.events.iter().cloned());
        if out.labels.len() >= min_labeled_rows {
            dataset.training.extend(out.labels.iter().cloned());
        } else {
            tracing::debug!(
                symbol = %out.symbol,
                labels = out.labels.len(),
                min_labeled_rows,
                "dropping training rows below minimum"
            );
        }
    }
    dataset
}

/// Rank events by RSI_DIFF descending (undefined last), keep the last
/// `count` of that ranking, and return them in date order.
pub fn select_events(mut records: Vec<ReversalRecord>, count: usize) -> Vec<ReversalRecord> {
    records.sort_by(|a, b| match (a.rsi_diff, b.rsi_diff) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let tail = records.len().saturating_sub(count);
    let mut selected = records.split_off(tail);
    selected.sort_by_key(|r| r.event.date);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use revlab_core::domain::{Bar, Direction, IndicatorRow, ReversalEvent, Target};
    use revlab_core::{SeriesOutput, SkipReason};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn record(symbol: &str, day: u32, rsi_diff: Option<f64>) -> ReversalRecord {
        let bar = Bar {
            date: date(day),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 10,
        };
        ReversalRecord {
            row: IndicatorRow::bare(bar),
            event: ReversalEvent {
                bar_index: day as usize,
                date: date(day),
                symbol: symbol.to_string(),
                direction: Direction::Bullish,
                entry_price: 100.0,
                stop_loss: 99.0,
                target_price: 102.0,
                strike: 150,
                synthetic_label: format!("{symbol} 150 CE"),
            },
            rsi_diff,
        }
    }

    fn label(symbol: &str, day: u32) -> LabeledRow {
        LabeledRow {
            date: date(day),
            symbol: symbol.to_string(),
            rsi: 50.0,
            macd_diff: 0.1,
            volume: 10,
            atr: 1.0,
            prev_change: 0.0,
            target: Target::Miss,
        }
    }

    fn processed(symbol: &str, events: Vec<ReversalRecord>, labels: usize) -> SymbolOutcome {
        SymbolOutcome {
            symbol: symbol.to_string(),
            source: None,
            result: Ok(SeriesOutput {
                symbol: symbol.to_string(),
                bar_count: 60,
                events,
                labels: (1..=labels as u32).map(|d| label(symbol, d)).collect(),
            }),
        }
    }

    #[test]
    fn concatenates_in_symbol_order_and_skips_failures() {
        let outcomes = vec![
            processed("B", vec![record("B", 5, None)], 2),
            SymbolOutcome {
                symbol: "X".into(),
                source: None,
                result: Err(SkipReason::Empty),
            },
            processed("A", vec![record("A", 1, None), record("A", 9, Some(2.0))], 3),
        ];

        let dataset = assemble(&outcomes, 1);
        let symbols: Vec<&str> = dataset
            .reversals
            .iter()
            .map(|r| r.event.symbol.as_str())
            .collect();
        assert_eq!(symbols, ["B", "A", "A"]);
        assert_eq!(dataset.training.len(), 5);
        assert_eq!(dataset.training[0].symbol, "B");
        assert_eq!(dataset.training[2].symbol, "A");
    }

    #[test]
    fn min_labeled_rows_drops_thin_symbols() {
        let outcomes = vec![processed("A", vec![], 3), processed("B", vec![], 12)];
        let dataset = assemble(&outcomes, 10);
        assert!(dataset.training.iter().all(|r| r.symbol == "B"));
        assert_eq!(dataset.training.len(), 12);
    }

    #[test]
    fn empty_outcomes_give_empty_dataset() {
        assert!(assemble(&[], 1).is_empty());
    }

    #[test]
    fn selection_keeps_tail_of_descending_rank_in_date_order() {
        let records = vec![
            record("A", 1, None),
            record("A", 2, Some(5.0)),
            record("A", 3, Some(-1.0)),
            record("B", 4, Some(3.0)),
            record("B", 5, Some(0.5)),
        ];
        // Ranked: 5.0, 3.0, 0.5, -1.0, None. Last three: 0.5, -1.0, None.
        let selected = select_events(records, 3);
        let days: Vec<NaiveDate> = selected.iter().map(|r| r.event.date).collect();
        assert_eq!(days, [date(1), date(3), date(5)]);
    }

    #[test]
    fn selection_larger_than_input_keeps_everything() {
        let records = vec![record("A", 7, Some(1.0)), record("A", 2, Some(4.0))];
        let selected = select_events(records, 10);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].event.date, date(2));
    }
}
