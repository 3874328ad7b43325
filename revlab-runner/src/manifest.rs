//! Run manifest: what was asked for, what was produced, what was skipped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use revlab_core::data::DataSource;

use crate::batch::SymbolOutcome;
use crate::export::ExportedFiles;

/// Current schema version for `manifest.json`.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSymbol {
    pub symbol: String,
    pub source: Option<DataSource>,
    pub bars: usize,
    pub events: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub config_hash: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub universe_fallback: bool,
    /// True when any symbol ran on synthetic bars.
    pub synthetic: bool,
    pub processed: Vec<ProcessedSymbol>,
    pub skipped: Vec<SkippedSymbol>,
    pub files: ExportedFiles,
}

impl RunManifest {
    pub fn new(
        config_hash: String,
        (start, end): (NaiveDate, NaiveDate),
        universe_fallback: bool,
        outcomes: &[SymbolOutcome],
        files: ExportedFiles,
    ) -> Self {
        let mut processed = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match &outcome.result {
                Ok(out) => processed.push(ProcessedSymbol {
                    symbol: outcome.symbol.clone(),
                    source: outcome.source,
                    bars: out.bar_count,
                    events: out.events.len(),
                    labels: out.labels.len(),
                }),
                Err(reason) => skipped.push(SkippedSymbol {
                    symbol: outcome.symbol.clone(),
                    kind: reason.kind().to_string(),
                    reason: reason.to_string(),
                }),
            }
        }
        let synthetic = processed
            .iter()
            .any(|p| p.source.is_some_and(DataSource::is_synthetic));

        Self {
            schema_version: SCHEMA_VERSION,
            config_hash,
            start,
            end,
            universe_fallback,
            synthetic,
            processed,
            skipped,
            files,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write manifest: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportedFile;
    use revlab_core::data::DataError;
    use revlab_core::{SeriesOutput, SkipReason};
    use std::path::PathBuf;

    fn files() -> ExportedFiles {
        let file = |name: &str| ExportedFile {
            path: PathBuf::from(name),
            rows: 0,
            blake3: "00".into(),
        };
        ExportedFiles {
            reversals: file("r.csv"),
            training: file("t.csv"),
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    #[test]
    fn splits_processed_and_skipped() {
        let outcomes = vec![
            SymbolOutcome {
                symbol: "TCS".into(),
                source: Some(DataSource::Synthetic),
                result: Ok(SeriesOutput {
                    symbol: "TCS".into(),
                    bar_count: 120,
                    events: vec![],
                    labels: vec![],
                }),
            },
            SymbolOutcome {
                symbol: "GONE".into(),
                source: None,
                result: Err(SkipReason::Fetch(DataError::SymbolNotFound {
                    symbol: "GONE".into(),
                })),
            },
            SymbolOutcome {
                symbol: "TINY".into(),
                source: Some(DataSource::YahooFinance),
                result: Err(SkipReason::TooShort { bars: 10, min: 30 }),
            },
        ];

        let manifest = RunManifest::new("abc".into(), range(), false, &outcomes, files());
        assert!(manifest.synthetic);
        assert_eq!(manifest.processed.len(), 1);
        assert_eq!(manifest.processed[0].bars, 120);
        let kinds: Vec<&str> = manifest.skipped.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["fetch", "too_short"]);
        assert_eq!(manifest.skipped[1].reason, "only 10 bars, need at least 30");
    }

    #[test]
    fn written_manifest_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = RunManifest::new("abc".into(), range(), true, &[], files());
        manifest.write(&path).unwrap();

        let parsed: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        assert!(!parsed.synthetic);
        assert!(parsed.universe_fallback);
    }
}
