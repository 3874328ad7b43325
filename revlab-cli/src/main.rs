//! RevLab CLI: build reversal datasets, dump indicators, manage data.
//!
//! Commands:
//! - `generate`: run the full batch and write the reversal and training tables
//! - `indicators`: dump every indicator column for one symbol
//! - `download`: fetch bars from Yahoo Finance into the Parquet cache
//! - `universe`: print the resolved symbol universe

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use revlab_core::data::{DataProvider, ParquetCache, Universe, UniverseSource, YahooProvider};
use revlab_core::engine::compute_indicators;
use revlab_core::labeling::LabelPolicy;
use revlab_runner::{
    build_provider, indicators_csv, load_series, run_dataset, LoadOptions, RunConfig, RunStatus,
    TracingProgress,
};

#[derive(Parser)]
#[command(
    name = "revlab",
    about = "RevLab CLI: Bollinger reversal signals and forward-labeled training data"
)]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Atr,
    Percent,
}

#[derive(Clone, Copy, ValueEnum)]
enum UniverseArg {
    Remote,
    Nifty50,
    Fallback,
}

/// Flags shared by commands that load bars.
#[derive(clap::Args)]
struct DataArgs {
    /// Path to a TOML run config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD). Defaults to end minus the lookback window.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Offline mode: no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use synthetic data as fallback.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Read bars from `{dir}/{SYMBOL}.csv` instead of downloading.
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reversal-event and training tables for a universe.
    Generate {
        #[command(flatten)]
        data: DataArgs,

        /// Symbols to process (overrides the configured universe).
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Labeling policy.
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Threshold: ATR multiple for `atr`, fraction for `percent`.
        #[arg(long)]
        threshold: Option<f64>,

        /// Keep only this many reversal events, ranked by RSI_DIFF.
        #[arg(long)]
        count: Option<usize>,

        /// Worker threads (0 = all cores).
        #[arg(long)]
        workers: Option<usize>,

        /// Output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Dump every indicator column for one symbol as CSV.
    Indicators {
        #[command(flatten)]
        data: DataArgs,

        /// Symbol (bare, without exchange suffix).
        #[arg(long)]
        symbol: String,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Download bars from Yahoo Finance into the Parquet cache.
    Download {
        /// Symbols to download (bare, e.g. RELIANCE TCS).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 180 days before end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Exchange suffix appended when querying Yahoo.
        #[arg(long, default_value = ".NS")]
        suffix: String,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Print the resolved symbol universe.
    Universe {
        #[arg(long, value_enum, default_value_t = UniverseArg::Remote)]
        source: UniverseArg,

        /// Maximum number of symbols.
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Generate {
            data,
            symbols,
            policy,
            threshold,
            count,
            workers,
            output_dir,
        } => {
            let mut config = load_config(&data)?;
            if !symbols.is_empty() {
                config.universe = UniverseSource::List { symbols };
            }
            if policy.is_some() || threshold.is_some() {
                config.labeling = label_policy(policy, threshold, config.labeling);
            }
            if count.is_some() {
                config.selection.count = count;
            }
            if let Some(workers) = workers {
                config.runtime.workers = workers;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            run_generate(&config)
        }
        Commands::Indicators {
            data,
            symbol,
            output,
        } => {
            let config = load_config(&data)?;
            run_indicators(&config, &symbol, output.as_deref())
        }
        Commands::Download {
            symbols,
            start,
            end,
            suffix,
            force,
            cache_dir,
        } => run_download(symbols, start, end, suffix, force, cache_dir),
        Commands::Universe { source, max } => {
            let source = match source {
                UniverseArg::Remote => UniverseSource::default(),
                UniverseArg::Nifty50 => UniverseSource::Nifty50,
                UniverseArg::Fallback => UniverseSource::Fallback,
            };
            let universe = Universe::resolve(&source).truncate(max);
            if universe.is_fallback {
                eprintln!("WARNING: using built-in fallback list");
            }
            for symbol in &universe.symbols {
                println!("{symbol}");
            }
            Ok(())
        }
    }
}

fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let (writer, guard) = non_blocking(file);
        // The writer must outlive every log call.
        let _guard = Box::leak(Box::new(guard));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("dates must be YYYY-MM-DD")
}

/// Config file (or defaults) with the shared data flags applied.
fn load_config(args: &DataArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = RunConfig::from_file(path)?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => RunConfig::default(),
    };
    if let Some(start) = parse_date(args.start.as_deref())? {
        config.data.start_date = Some(start);
    }
    if let Some(end) = parse_date(args.end.as_deref())? {
        config.data.end_date = Some(end);
    }
    if args.offline {
        config.data.offline = true;
    }
    if args.synthetic {
        config.data.synthetic = true;
    }
    if let Some(dir) = &args.csv_dir {
        config.data.csv_dir = Some(dir.clone());
    }
    Ok(config)
}

fn label_policy(
    policy: Option<PolicyArg>,
    threshold: Option<f64>,
    current: LabelPolicy,
) -> LabelPolicy {
    match (policy, current) {
        (Some(PolicyArg::Atr), _) | (None, LabelPolicy::AtrMultiple { .. }) => {
            LabelPolicy::AtrMultiple {
                k: threshold.unwrap_or(match current {
                    LabelPolicy::AtrMultiple { k } => k,
                    LabelPolicy::Percent { .. } => 1.25,
                }),
            }
        }
        (Some(PolicyArg::Percent), _) | (None, LabelPolicy::Percent { .. }) => LabelPolicy::Percent {
            p: threshold.unwrap_or(match current {
                LabelPolicy::Percent { p } => p,
                LabelPolicy::AtrMultiple { .. } => 0.02,
            }),
        },
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_generate(config: &RunConfig) -> Result<()> {
    let provider = build_provider(&config.data)?;
    let summary = run_dataset(config, provider.as_deref(), today(), &TracingProgress)?;

    println!();
    println!("=== Reversal Dataset ===");
    println!(
        "Symbols:        {} processed, {} skipped",
        summary.processed(),
        summary.skipped()
    );
    println!("Reversals:      {}", summary.dataset.reversals.len());
    println!("Training rows:  {}", summary.dataset.training.len());
    println!("Signals file:   {}", summary.files.reversals.path.display());
    println!("Training file:  {}", summary.files.training.path.display());
    if summary.manifest.synthetic {
        println!("WARNING: Results include SYNTHETIC data");
    }
    if summary.universe.is_fallback {
        println!("WARNING: Universe download failed; used built-in fallback list");
    }
    match summary.status() {
        RunStatus::Complete => {}
        RunStatus::NoSignals => println!("No signals detected."),
        RunStatus::NoTrainingRows => println!("No training rows labeled."),
        RunStatus::NoUsableData => println!("No usable data: every symbol was skipped."),
    }
    Ok(())
}

fn run_indicators(config: &RunConfig, symbol: &str, output: Option<&Path>) -> Result<()> {
    config.validate()?;
    let (start, end) = config.date_range(today())?;
    let provider = build_provider(&config.data)?;
    let cache = config
        .data
        .cache
        .then(|| ParquetCache::new(&config.data.cache_dir, config.data.cache_origin()));
    let opts = LoadOptions {
        start,
        end,
        offline: config.data.offline,
        synthetic: config.data.synthetic,
        force: false,
    };

    let loaded = load_series(symbol, cache.as_ref(), provider.as_deref(), &opts)
        .with_context(|| format!("no data for {symbol}"))?;
    if loaded.bars.is_empty() {
        bail!("no bars for {symbol} between {start} and {end}");
    }
    let rows = compute_indicators(loaded.bars, &config.indicators);
    let csv = indicators_csv(&rows)?;

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} rows written to {}", rows.len(), path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    suffix: String,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let end_date = parse_date(end.as_deref())?.unwrap_or_else(today);
    let start_date =
        parse_date(start.as_deref())?.unwrap_or(end_date - chrono::Duration::days(180));

    let cache = ParquetCache::new(cache_dir, YahooProvider::cache_origin(&suffix));
    let provider = YahooProvider::new(suffix)?;
    let opts = LoadOptions {
        start: start_date,
        end: end_date,
        offline: false,
        synthetic: false,
        force,
    };

    let mut failed = 0;
    for symbol in &symbols {
        let symbol = symbol.trim().to_uppercase();
        match load_series(&symbol, Some(&cache), Some(&provider as &dyn DataProvider), &opts) {
            Ok(loaded) => println!("{symbol}: {} bars ({:?})", loaded.bars.len(), loaded.source),
            Err(err) => {
                eprintln!("Error for {symbol}: {err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_override_keeps_threshold_family() {
        let atr = LabelPolicy::AtrMultiple { k: 1.5 };
        assert_eq!(label_policy(None, Some(1.25), atr), LabelPolicy::AtrMultiple { k: 1.25 });
        assert_eq!(
            label_policy(Some(PolicyArg::Percent), None, atr),
            LabelPolicy::Percent { p: 0.02 }
        );
        assert_eq!(
            label_policy(Some(PolicyArg::Percent), Some(0.03), atr),
            LabelPolicy::Percent { p: 0.03 }
        );
        assert_eq!(
            label_policy(Some(PolicyArg::Atr), None, LabelPolicy::Percent { p: 0.02 }),
            LabelPolicy::AtrMultiple { k: 1.25 }
        );
    }

    #[test]
    fn cli_parses_generate_overrides() {
        let cli = Cli::try_parse_from([
            "revlab",
            "generate",
            "--symbols",
            "RELIANCE",
            "TCS",
            "--policy",
            "percent",
            "--offline",
            "--workers",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                data,
                symbols,
                workers,
                ..
            } => {
                assert_eq!(symbols, ["RELIANCE", "TCS"]);
                assert!(data.offline);
                assert_eq!(workers, Some(2));
            }
            _ => panic!("expected generate"),
        }
    }
}
