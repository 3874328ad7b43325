//! CSV export of the reversal-event and training tables.
//!
//! Column order is fixed. Undefined values are written as empty fields,
//! and a header row is written even when a table has no rows.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use revlab_core::domain::{IndicatorRow, LabeledRow};
use revlab_core::ReversalRecord;

use crate::assemble::Dataset;
use crate::config::OutputConfig;

pub const REVERSAL_COLUMNS: [&str; 18] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "BB_upper",
    "BB_lower",
    "RSI",
    "MACD_DIFF",
    "ATR",
    "Prev_Change",
    "Target",
    "SignalType",
    "Option",
    "SL",
    "TargetPrice",
    "Symbol",
];

pub const RSI_DIFF_COLUMN: &str = "RSI_DIFF";

pub const TRAINING_COLUMNS: [&str; 8] = [
    "Date",
    "Symbol",
    "RSI",
    "MACD_DIFF",
    "Volume",
    "ATR",
    "Prev_Change",
    "Target",
];

pub const INDICATOR_COLUMNS: [&str; 14] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "BB_middle",
    "BB_upper",
    "BB_lower",
    "BB_bandwidth",
    "RSI",
    "MACD_DIFF",
    "ATR",
    "Prev_Change",
];

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render the reversal-event table.
pub fn reversals_csv(records: &[ReversalRecord], include_rsi_diff: bool) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = REVERSAL_COLUMNS.to_vec();
    if include_rsi_diff {
        header.push(RSI_DIFF_COLUMN);
    }
    wtr.write_record(&header)?;

    for r in records {
        let bar = &r.row.bar;
        let mut fields = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            opt(r.row.bb_upper),
            opt(r.row.bb_lower),
            opt(r.row.rsi),
            opt(r.row.macd_diff),
            opt(r.row.atr),
            opt(r.row.prev_change),
            r.event.direction.target().to_string(),
            r.event.direction.to_string(),
            r.event.synthetic_label.clone(),
            r.event.stop_loss.to_string(),
            r.event.target_price.to_string(),
            r.event.symbol.clone(),
        ];
        if include_rsi_diff {
            fields.push(opt(r.rsi_diff));
        }
        wtr.write_record(&fields)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Render the training table.
pub fn training_csv(rows: &[LabeledRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRAINING_COLUMNS)?;

    for r in rows {
        wtr.write_record([
            &r.date.format("%Y-%m-%d").to_string(),
            &r.symbol,
            &r.rsi.to_string(),
            &r.macd_diff.to_string(),
            &r.volume.to_string(),
            &r.atr.to_string(),
            &r.prev_change.to_string(),
            &r.target.as_u8().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Render every indicator column for one symbol, warm-up rows included.
pub fn indicators_csv(rows: &[IndicatorRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(INDICATOR_COLUMNS)?;

    for r in rows {
        wtr.write_record([
            r.bar.date.format("%Y-%m-%d").to_string(),
            r.bar.open.to_string(),
            r.bar.high.to_string(),
            r.bar.low.to_string(),
            r.bar.close.to_string(),
            r.bar.volume.to_string(),
            opt(r.bb_middle),
            opt(r.bb_upper),
            opt(r.bb_lower),
            opt(r.bb_bandwidth),
            opt(r.rsi),
            opt(r.macd_diff),
            opt(r.atr),
            opt(r.prev_change),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// A file written by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub rows: usize,
    pub blake3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFiles {
    pub reversals: ExportedFile,
    pub training: ExportedFile,
}

fn write_table(path: &Path, content: &str, rows: usize) -> Result<ExportedFile> {
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(ExportedFile {
        path: path.to_path_buf(),
        rows,
        blake3: blake3::hash(content.as_bytes()).to_hex().to_string(),
    })
}

/// Write both tables under `output.dir`.
pub fn write_dataset(dataset: &Dataset, output: &OutputConfig) -> Result<ExportedFiles> {
    std::fs::create_dir_all(&output.dir)
        .with_context(|| format!("failed to create output dir: {}", output.dir.display()))?;

    let reversals = reversals_csv(&dataset.reversals, output.include_rsi_diff)?;
    let training = training_csv(&dataset.training)?;

    Ok(ExportedFiles {
        reversals: write_table(&output.reversals_path(), &reversals, dataset.reversals.len())?,
        training: write_table(&output.training_path(), &training, dataset.training.len())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use revlab_core::domain::{Bar, Direction, IndicatorRow, ReversalEvent, Target};

    fn sample_record(rsi_diff: Option<f64>) -> ReversalRecord {
        let date = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        let mut row = IndicatorRow::bare(Bar {
            date,
            open: 2890.5,
            high: 2915.0,
            low: 2880.25,
            close: 2910.0,
            volume: 1_234_567,
        });
        row.bb_upper = Some(2990.0);
        row.bb_lower = Some(2895.5);
        row.rsi = Some(41.5);
        row.macd_diff = Some(-3.25);
        row.atr = Some(40.0);
        row.prev_change = None;
        ReversalRecord {
            row,
            event: ReversalEvent {
                bar_index: 40,
                date,
                symbol: "RELIANCE".into(),
                direction: Direction::Bullish,
                entry_price: 2910.0,
                stop_loss: 2898.0,
                target_price: 2946.0,
                strike: 2950,
                synthetic_label: "RELIANCE 2950 CE".into(),
            },
            rsi_diff,
        }
    }

    #[test]
    fn empty_tables_have_header_only() {
        let csv = reversals_csv(&[], true).unwrap();
        assert_eq!(
            csv,
            "Date,Open,High,Low,Close,Volume,BB_upper,BB_lower,RSI,MACD_DIFF,ATR,Prev_Change,\
             Target,SignalType,Option,SL,TargetPrice,Symbol,RSI_DIFF\n"
        );
        assert_eq!(
            training_csv(&[]).unwrap(),
            "Date,Symbol,RSI,MACD_DIFF,Volume,ATR,Prev_Change,Target\n"
        );
    }

    #[test]
    fn reversal_row_layout() {
        let csv = reversals_csv(&[sample_record(None)], true).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2024-05-14,2890.5,2915,2880.25,2910,1234567,2990,2895.5,41.5,-3.25,40,,\
             1,Bullish,RELIANCE 2950 CE,2898,2946,RELIANCE,"
        );
    }

    #[test]
    fn rsi_diff_column_is_optional() {
        let csv = reversals_csv(&[sample_record(Some(6.5))], false).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.ends_with(",Symbol"));
        assert!(csv.lines().nth(1).unwrap().ends_with(",RELIANCE"));

        let with = reversals_csv(&[sample_record(Some(6.5))], true).unwrap();
        assert!(with.lines().nth(1).unwrap().ends_with(",RELIANCE,6.5"));
    }

    #[test]
    fn training_row_layout() {
        let row = LabeledRow {
            date: NaiveDate::from_ymd_opt(2024, 5, 14).unwrap(),
            symbol: "TCS".into(),
            rsi: 55.25,
            macd_diff: 1.5,
            volume: 900,
            atr: 12.0,
            prev_change: -0.75,
            target: Target::Hit,
        };
        let csv = training_csv(&[row]).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "2024-05-14,TCS,55.25,1.5,900,12,-0.75,1"
        );
    }

    #[test]
    fn indicator_dump_keeps_warmup_rows() {
        let mut record = sample_record(None);
        record.row.bb_middle = Some(2942.75);
        record.row.bb_bandwidth = Some(94.5);
        let warm = IndicatorRow::bare(record.row.bar.clone());

        let csv = indicators_csv(&[warm, record.row]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Date,Open,High,Low,Close,Volume,BB_middle,BB_upper,BB_lower,BB_bandwidth,\
             RSI,MACD_DIFF,ATR,Prev_Change"
        );
        assert_eq!(lines[1], "2024-05-14,2890.5,2915,2880.25,2910,1234567,,,,,,,,");
        assert_eq!(
            lines[2],
            "2024-05-14,2890.5,2915,2880.25,2910,1234567,2942.75,2990,2895.5,94.5,41.5,-3.25,40,"
        );
    }

    #[test]
    fn write_dataset_creates_files_with_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            dir: dir.path().join("nested"),
            ..Default::default()
        };
        let dataset = Dataset {
            reversals: vec![sample_record(None)],
            training: vec![],
        };

        let files = write_dataset(&dataset, &output).unwrap();
        assert_eq!(files.reversals.rows, 1);
        assert_eq!(files.training.rows, 0);

        let training = std::fs::read_to_string(&files.training.path).unwrap();
        assert_eq!(training, "Date,Symbol,RSI,MACD_DIFF,Volume,ATR,Prev_Change,Target\n");
        assert_eq!(
            files.training.blake3,
            blake3::hash(training.as_bytes()).to_hex().to_string()
        );
    }
}
