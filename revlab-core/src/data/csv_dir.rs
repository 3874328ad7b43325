//! Offline provider reading `{dir}/{SYMBOL}.csv`.
//!
//! Expected header: `Date,Open,High,Low,Close,Volume` (case-insensitive,
//! extra columns ignored). Dates are `YYYY-MM-DD`. Rows with a blank price
//! are dropped, matching how the Yahoo provider treats missing sessions.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache origin for bars read from `dir`.
    pub fn cache_origin(dir: &Path) -> String {
        format!("csv_dir:{}", dir.display())
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse every bar in a CSV file.
    pub fn read_file(path: &Path) -> Result<Vec<Bar>, DataError> {
        let malformed = |reason: String| DataError::Malformed {
            path: path.display().to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| malformed(e.to_string()))?;

        let headers = reader.headers().map_err(|e| malformed(e.to_string()))?.clone();
        let index = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| malformed(format!("missing column '{name}'")))
        };
        let cols = [
            index("date")?,
            index("open")?,
            index("high")?,
            index("low")?,
            index("close")?,
            index("volume")?,
        ];

        let mut bars = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let field = |i: usize| record.get(cols[i]).unwrap_or("");

            let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
                .map_err(|e| malformed(format!("row {}: bad date '{}': {e}", line + 1, field(0))))?;

            let mut prices = [0.0; 4];
            let mut blank = false;
            for (slot, col) in prices.iter_mut().zip(1..=4) {
                let raw = field(col);
                if raw.is_empty() {
                    blank = true;
                    break;
                }
                *slot = raw
                    .parse()
                    .map_err(|e| malformed(format!("row {}: bad price '{raw}': {e}", line + 1)))?;
            }
            if blank {
                continue;
            }

            let volume = match field(5) {
                "" => 0,
                raw => raw
                    .parse::<f64>()
                    .map(|v| v.max(0.0) as u64)
                    .map_err(|e| malformed(format!("row {}: bad volume '{raw}': {e}", line + 1)))?,
            };

            let [open, high, low, close] = prices;
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        Ok(bars)
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut bars = Self::read_file(&path)?;
        bars.retain(|b| b.date >= start && b.date <= end);
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
