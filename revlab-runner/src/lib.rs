//! RevLab Runner: batch orchestration and dataset export.
//!
//! This crate builds on `revlab-core` to provide:
//! - TOML run configuration
//! - Data loading with cache/download/synthetic fallback
//! - Parallel per-symbol batch with ordered reduction
//! - Event selection, CSV export, and the run manifest

pub mod assemble;
pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod manifest;
pub mod runner;

pub use assemble::{assemble, select_events, Dataset};
pub use batch::{run_batch, BatchProgress, BatchSources, SymbolOutcome, TracingProgress};
pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_series, LoadOptions, LoadedSeries};
pub use export::{indicators_csv, reversals_csv, training_csv, write_dataset, ExportedFiles};
pub use manifest::RunManifest;
pub use runner::{build_provider, resolve_universe, run_dataset, RunError, RunStatus, RunSummary};
