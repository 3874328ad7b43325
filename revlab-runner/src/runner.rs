//! End-to-end dataset run: universe → batch → assemble → export → manifest.

use chrono::NaiveDate;
use thiserror::Error;

use revlab_core::data::{
    CsvDirProvider, DataError, DataProvider, ParquetCache, Universe, UniverseSource, YahooProvider,
};

use crate::assemble::{assemble, select_events, Dataset};
use crate::batch::{run_batch, BatchProgress, BatchSources, SymbolOutcome};
use crate::config::{ConfigError, DataConfig, RunConfig};
use crate::data_loader::LoadOptions;
use crate::export::{write_dataset, ExportedFiles};
use crate::manifest::RunManifest;

/// Errors that abort a run. Per-symbol failures never do.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data provider error: {0}")]
    Data(#[from] DataError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("export failed: {0:#}")]
    Export(#[from] anyhow::Error),
}

/// Overall result of a run, for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    /// Some symbols were processed but none produced a reversal event.
    NoSignals,
    /// Events were found but the training table is header-only.
    NoTrainingRows,
    /// No symbol produced usable bars.
    NoUsableData,
}

#[derive(Debug)]
pub struct RunSummary {
    pub universe: Universe,
    pub outcomes: Vec<SymbolOutcome>,
    pub dataset: Dataset,
    pub files: ExportedFiles,
    pub manifest: RunManifest,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }

    pub fn status(&self) -> RunStatus {
        if self.processed() == 0 {
            RunStatus::NoUsableData
        } else if self.dataset.reversals.is_empty() {
            RunStatus::NoSignals
        } else if self.dataset.training.is_empty() {
            RunStatus::NoTrainingRows
        } else {
            RunStatus::Complete
        }
    }
}

/// Provider for a data config: none when offline, a CSV directory when
/// configured, Yahoo otherwise.
pub fn build_provider(data: &DataConfig) -> Result<Option<Box<dyn DataProvider>>, DataError> {
    if data.offline {
        return Ok(None);
    }
    if let Some(dir) = &data.csv_dir {
        return Ok(Some(Box::new(CsvDirProvider::new(dir))));
    }
    Ok(Some(Box::new(YahooProvider::new(data.ticker_suffix.clone())?)))
}

/// Resolve the configured universe, capped at `max_symbols`.
///
/// Offline runs never download the remote list.
pub fn resolve_universe(config: &RunConfig) -> Universe {
    let universe = match &config.universe {
        UniverseSource::Remote { .. } if config.data.offline => {
            tracing::warn!("offline: using fallback universe instead of remote list");
            Universe::fallback()
        }
        source => Universe::resolve(source),
    };
    universe.truncate(config.data.max_symbols)
}

/// Run the whole dataset build and write its outputs.
pub fn run_dataset(
    config: &RunConfig,
    provider: Option<&dyn DataProvider>,
    today: NaiveDate,
    progress: &dyn BatchProgress,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let (start, end) = config.date_range(today)?;
    let universe = resolve_universe(config);
    tracing::info!(
        symbols = universe.len(),
        fallback = universe.is_fallback,
        %start,
        %end,
        "starting run"
    );

    let cache = config
        .data
        .cache
        .then(|| ParquetCache::new(&config.data.cache_dir, config.data.cache_origin()));
    let sources = BatchSources {
        cache: cache.as_ref(),
        provider,
    };
    let load = LoadOptions {
        start,
        end,
        offline: config.data.offline,
        synthetic: config.data.synthetic,
        force: false,
    };

    let outcomes = run_batch(
        &universe.symbols,
        sources,
        &load,
        &config.engine_config(),
        config.runtime.workers,
        progress,
    )?;

    let mut dataset = assemble(&outcomes, config.output.min_labeled_rows);
    if let Some(count) = config.selection.count {
        dataset.reversals = select_events(dataset.reversals, count);
    }

    let files = write_dataset(&dataset, &config.output)?;
    let manifest = RunManifest::new(
        config.config_hash()?,
        (start, end),
        universe.is_fallback,
        &outcomes,
        files.clone(),
    );
    if config.output.manifest {
        manifest.write(&config.output.manifest_path())?;
    }

    tracing::info!(
        reversals = dataset.reversals.len(),
        training = dataset.training.len(),
        "dataset written"
    );

    Ok(RunSummary {
        universe,
        outcomes,
        dataset,
        files,
        manifest,
    })
}
