//! Event detection over indicator rows.
//!
//! Detectors only read rows at or before the index being evaluated.

pub mod reversal;

pub use reversal::{round_price, synthetic_strike, ReversalDetector, ReversalSettings};
