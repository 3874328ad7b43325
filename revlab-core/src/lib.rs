//! RevLab Core: indicators, reversal detection, and forward labeling.
//!
//! This crate holds the per-symbol engine and its data sources:
//! - Domain types (bars, indicator rows, reversal events, labeled rows)
//! - Streaming indicators (Bollinger, RSI, MACD, ATR, previous change)
//! - Two-bar Bollinger reversal detector
//! - Forward-outcome labeler with ATR-relative and percentage policies
//! - Per-series pipeline returning output or a skip reason
//! - Data providers (Yahoo, CSV directory, synthetic), Parquet cache, universe

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod labeling;
pub mod pipeline;
pub mod signals;

pub use pipeline::{process_series, EngineConfig, ReversalRecord, SeriesOutput, SkipReason};
