//! Deterministic synthetic bars for development without market data.
//!
//! A random walk seeded from the BLAKE3 hash of the symbol, so the same
//! symbol and date range always produce the same bars. Output built on these
//! bars is tagged as synthetic by the runner.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

/// Weekday random walk starting at 100.0.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: generate_synthetic_bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let (start, end) = range();
        assert_eq!(
            generate_synthetic_bars("SBIN", start, end),
            generate_synthetic_bars("SBIN", start, end)
        );
    }

    #[test]
    fn different_symbols_diverge() {
        let (start, end) = range();
        let a = generate_synthetic_bars("SBIN", start, end);
        let b = generate_synthetic_bars("ITC", start, end);
        assert_eq!(a.len(), b.len());
        assert_ne!(a[0].close, b[0].close);
    }

    #[test]
    fn skips_weekends_and_stays_sane() {
        let (start, end) = range();
        let bars = generate_synthetic_bars("TCS", start, end);
        assert_eq!(bars.len(), 23);
        assert!(bars.iter().all(|b| b.is_sane() && b.low <= b.close && b.close <= b.high));
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
    }
}
