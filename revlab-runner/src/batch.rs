//! Parallel per-symbol batch.
//!
//! Each symbol is loaded and processed independently on a bounded rayon
//! pool. A failing symbol becomes a `SkipReason` in its own slot; it never
//! aborts the batch. Results come back in input symbol order regardless of
//! completion order.

use rayon::prelude::*;

use revlab_core::data::{DataProvider, DataSource, ParquetCache};
use revlab_core::{process_series, EngineConfig, SeriesOutput, SkipReason};

use crate::data_loader::{load_series, LoadOptions};

/// Outcome of one symbol's run.
#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    /// `None` when loading failed before any bars were obtained.
    pub source: Option<DataSource>,
    pub result: Result<SeriesOutput, SkipReason>,
}

impl SymbolOutcome {
    pub fn is_processed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Progress callbacks for a batch. Called from worker threads.
pub trait BatchProgress: Send + Sync {
    fn on_symbol(&self, outcome: &SymbolOutcome, index: usize, total: usize);
    fn on_batch_complete(&self, processed: usize, skipped: usize, total: usize);
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl BatchProgress for TracingProgress {
    fn on_symbol(&self, outcome: &SymbolOutcome, index: usize, total: usize) {
        match &outcome.result {
            Ok(out) => tracing::debug!(
                symbol = %outcome.symbol,
                index,
                total,
                bars = out.bar_count,
                events = out.events.len(),
                labels = out.labels.len(),
                "symbol processed"
            ),
            Err(reason) => tracing::warn!(
                symbol = %outcome.symbol,
                kind = reason.kind(),
                %reason,
                "skipping symbol"
            ),
        }
    }

    fn on_batch_complete(&self, processed: usize, skipped: usize, total: usize) {
        tracing::info!(processed, skipped, total, "batch complete");
    }
}

/// Data sources shared by every worker.
#[derive(Clone, Copy)]
pub struct BatchSources<'a> {
    pub cache: Option<&'a ParquetCache>,
    pub provider: Option<&'a dyn DataProvider>,
}

/// Load and process one symbol.
pub fn run_symbol(
    symbol: &str,
    sources: BatchSources<'_>,
    load: &LoadOptions,
    engine: &EngineConfig,
) -> SymbolOutcome {
    match load_series(symbol, sources.cache, sources.provider, load) {
        Ok(loaded) => SymbolOutcome {
            symbol: symbol.to_string(),
            source: Some(loaded.source),
            result: process_series(symbol, loaded.bars, engine),
        },
        Err(e) => SymbolOutcome {
            symbol: symbol.to_string(),
            source: None,
            result: Err(SkipReason::Fetch(e)),
        },
    }
}

/// Run every symbol on a pool of `workers` threads (0 = rayon default).
pub fn run_batch(
    symbols: &[String],
    sources: BatchSources<'_>,
    load: &LoadOptions,
    engine: &EngineConfig,
    workers: usize,
    progress: &dyn BatchProgress,
) -> Result<Vec<SymbolOutcome>, rayon::ThreadPoolBuildError> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let total = symbols.len();

    let outcomes: Vec<SymbolOutcome> = pool.install(|| {
        symbols
            .par_iter()
            .enumerate()
            .map(|(index, symbol)| {
                let outcome = run_symbol(symbol, sources, load, engine);
                progress.on_symbol(&outcome, index, total);
                outcome
            })
            .collect()
    });

    let processed = outcomes.iter().filter(|o| o.is_processed()).count();
    progress.on_batch_complete(processed, total - processed, total);
    Ok(outcomes)
}
