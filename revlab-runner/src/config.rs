//! Serializable run configuration.
//!
//! A `RunConfig` is loaded from TOML. Every section is optional and falls
//! back to the defaults used for the daily NSE dataset:
//!
//! ```toml
//! [data]
//! lookback_days = 180
//! ticker_suffix = ".NS"
//!
//! [universe]
//! type = "nifty50"
//!
//! [labeling]
//! type = "percent"
//! p = 0.02
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use revlab_core::data::{CsvDirProvider, UniverseSource, YahooProvider};
use revlab_core::engine::IndicatorSettings;
use revlab_core::labeling::LabelPolicy;
use revlab_core::pipeline::MIN_BARS;
use revlab_core::signals::ReversalSettings;
use revlab_core::EngineConfig;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Complete configuration for one dataset run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub data: DataConfig,
    pub universe: UniverseSource,
    pub indicators: IndicatorSettings,
    pub reversal: ReversalSettings,
    pub labeling: LabelPolicy,
    pub selection: SelectionConfig,
    pub output: OutputConfig,
    pub runtime: RuntimeConfig,
}

/// Where bars come from and which date window to request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Window length when `start_date` is not given.
    pub lookback_days: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Exchange suffix appended to each symbol when querying Yahoo.
    pub ticker_suffix: String,
    pub min_bars: usize,
    pub max_symbols: usize,
    pub cache_dir: PathBuf,
    /// Read and write the Parquet bar cache.
    pub cache: bool,
    /// Read `{csv_dir}/{SYMBOL}.csv` instead of downloading.
    pub csv_dir: Option<PathBuf>,
    pub offline: bool,
    pub synthetic: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            lookback_days: 180,
            start_date: None,
            end_date: None,
            ticker_suffix: ".NS".into(),
            min_bars: MIN_BARS,
            max_symbols: 100,
            cache_dir: PathBuf::from("data"),
            cache: true,
            csv_dir: None,
            offline: false,
            synthetic: false,
        }
    }
}

impl DataConfig {
    /// Origin the bar cache is bound to: the CSV directory when set,
    /// otherwise Yahoo with the configured ticker suffix.
    pub fn cache_origin(&self) -> String {
        match &self.csv_dir {
            Some(dir) => CsvDirProvider::cache_origin(dir),
            None => YahooProvider::cache_origin(&self.ticker_suffix),
        }
    }
}

/// Optional ranking of reversal events by RSI_DIFF.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Keep this many events; `None` keeps all of them.
    pub count: Option<usize>,
}

/// Output file names and table options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub reversals: String,
    pub training: String,
    pub include_rsi_diff: bool,
    /// A symbol contributes training rows only if it has at least this many.
    pub min_labeled_rows: usize,
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            reversals: "bollinger_reversal_signals.csv".into(),
            training: "reversal_training_data.csv".into(),
            include_rsi_diff: true,
            min_labeled_rows: 1,
            manifest: true,
        }
    }
}

impl OutputConfig {
    pub fn reversals_path(&self) -> PathBuf {
        self.dir.join(&self.reversals)
    }

    pub fn training_path(&self) -> PathBuf {
        self.dir.join(&self.training)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads; 0 uses the available parallelism.
    pub workers: usize,
}

impl RunConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate().map_err(ConfigError::Invalid)?;
        self.reversal.validate().map_err(ConfigError::Invalid)?;
        self.labeling.validate().map_err(ConfigError::Invalid)?;

        if self.data.lookback_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be positive, got {}",
                self.data.lookback_days
            )));
        }
        if self.data.min_bars == 0 {
            return Err(ConfigError::Invalid("min_bars must be >= 1".into()));
        }
        if self.data.max_symbols == 0 {
            return Err(ConfigError::Invalid("max_symbols must be >= 1".into()));
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if self.selection.count == Some(0) {
            return Err(ConfigError::Invalid("selection.count must be >= 1".into()));
        }
        if self.output.reversals.is_empty() || self.output.training.is_empty() {
            return Err(ConfigError::Invalid("output file names must not be empty".into()));
        }
        Ok(())
    }

    /// Parameters for the per-symbol pipeline.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            indicators: self.indicators.clone(),
            reversal: self.reversal.clone(),
            labeling: self.labeling,
            min_bars: self.data.min_bars,
        }
    }

    /// Requested `[start, end]`. Missing bounds are filled from `today`
    /// and `lookback_days`.
    pub fn date_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let end = self.data.end_date.unwrap_or(today);
        let start = match self.data.start_date {
            Some(start) => start,
            None => u64::try_from(self.data.lookback_days)
                .ok()
                .and_then(|days| end.checked_sub_days(Days::new(days)))
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "lookback_days {} is out of range for end date {end}",
                        self.data.lookback_days
                    ))
                })?,
        };
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok((start, end))
    }

    /// Deterministic BLAKE3 hash of the full configuration.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
