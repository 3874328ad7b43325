//! Bar loading for a single symbol.
//!
//! Fallback order:
//! 1. Cache fully covers the requested range → use it
//! 2. Provider available and not offline → fetch, then refresh the cache
//! 3. Offline with a partial cache → use what is cached
//! 4. `synthetic` enabled → generate synthetic bars (tagged)
//! 5. Otherwise → the fetch error (or `NoCachedData` when offline)
//!
//! Synthetic bars are never written to the cache. Cache entries written by
//! a different provider than the cache's origin are skipped.

use chrono::NaiveDate;

use revlab_core::data::{
    generate_synthetic_bars, CoverageResult, DataError, DataProvider, DataSource, ParquetCache,
};
use revlab_core::domain::Bar;

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Never make network requests.
    pub offline: bool,
    /// Generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
    /// Skip the cache read even when it covers the range.
    pub force: bool,
}

/// Bars for one symbol and where they came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Load bars for `symbol` with cache, provider, and synthetic fallback.
pub fn load_series(
    symbol: &str,
    cache: Option<&ParquetCache>,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedSeries, DataError> {
    if let (Some(cache), false) = (cache, opts.force) {
        if cache.covers_range(symbol, opts.start, opts.end) == CoverageResult::FullyCovered {
            match cache.load_range(symbol, opts.start, opts.end) {
                Ok(bars) => {
                    return Ok(LoadedSeries {
                        bars,
                        source: DataSource::Cache,
                    })
                }
                Err(e) => tracing::debug!(symbol, error = %e, "cache read failed"),
            }
        }
    }

    let mut fetch_error = None;
    if !opts.offline {
        if let Some(provider) = provider.filter(|p| p.is_available()) {
            match provider.fetch(symbol, opts.start, opts.end) {
                Ok(result) => {
                    if let Some(cache) = cache {
                        if !result.bars.is_empty() && !result.source.is_synthetic() {
                            if let Err(e) = cache.write(symbol, &result.bars, result.source) {
                                tracing::warn!(symbol, error = %e, "failed to cache bars");
                            }
                        }
                    }
                    return Ok(LoadedSeries {
                        bars: result.bars,
                        source: result.source,
                    });
                }
                Err(e) => {
                    tracing::debug!(symbol, provider = provider.name(), error = %e, "fetch failed");
                    fetch_error = Some(e);
                }
            }
        }
    }

    if opts.offline {
        if let Some(cache) = cache {
            if let Ok(bars) = cache.load_range(symbol, opts.start, opts.end) {
                return Ok(LoadedSeries {
                    bars,
                    source: DataSource::Cache,
                });
            }
        }
    }

    if opts.synthetic {
        tracing::warn!(symbol, "generating synthetic bars; results will be tagged synthetic");
        return Ok(LoadedSeries {
            bars: generate_synthetic_bars(symbol, opts.start, opts.end),
            source: DataSource::Synthetic,
        });
    }

    Err(fetch_error.unwrap_or_else(|| DataError::NoCachedData {
        symbol: symbol.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revlab_core::data::FetchResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        bars: Vec<Bar>,
        calls: AtomicUsize,
    }

    impl DataProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: self.bars.clone(),
                source: DataSource::YahooFinance,
            })
        }
    }

    struct FailingProvider;

    impl DataProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
            Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_bars() -> Vec<Bar> {
        (2..=5)
            .map(|day| Bar {
                date: d(day),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0 + day as f64,
                volume: 1000 * day as u64,
            })
            .collect()
    }

    fn opts(offline: bool, synthetic: bool) -> LoadOptions {
        LoadOptions {
            start: d(2),
            end: d(5),
            offline,
            synthetic,
            force: false,
        }
    }

    #[test]
    fn fetch_populates_cache_then_cache_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path(), "yahoo_finance:.NS");
        let provider = CountingProvider {
            bars: sample_bars(),
            calls: AtomicUsize::new(0),
        };

        let first = load_series("SBIN", Some(&cache), Some(&provider), &opts(false, false)).unwrap();
        assert_eq!(first.source, DataSource::YahooFinance);
        assert_eq!(first.bars, sample_bars());

        let second = load_series("SBIN", Some(&cache), Some(&provider), &opts(false, false)).unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(second.bars, sample_bars());
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn cache_from_another_provider_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        ParquetCache::new(dir.path(), "csv_dir:bars")
            .write("SBIN", &sample_bars(), DataSource::CsvImport)
            .unwrap();

        let cache = ParquetCache::new(dir.path(), "yahoo_finance:.NS");
        let provider = CountingProvider {
            bars: sample_bars(),
            calls: AtomicUsize::new(0),
        };
        let loaded = load_series("SBIN", Some(&cache), Some(&provider), &opts(false, false)).unwrap();
        assert_eq!(loaded.source, DataSource::YahooFinance);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
        assert_eq!(cache.get_meta("SBIN").unwrap().origin, "yahoo_finance:.NS");

        let err = load_series(
            "SBIN",
            Some(&ParquetCache::new(dir.path(), "yahoo_finance:.BO")),
            None,
            &opts(true, false),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::NoCachedData { .. }));
    }

    #[test]
    fn offline_without_cache_is_no_cached_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path(), "yahoo_finance:.NS");
        let err = load_series("SBIN", Some(&cache), Some(&FailingProvider), &opts(true, false))
            .unwrap_err();
        assert!(matches!(err, DataError::NoCachedData { .. }));
    }

    #[test]
    fn fetch_error_surfaces_when_no_fallback() {
        let err = load_series("NOPE", None, Some(&FailingProvider), &opts(false, false)).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn synthetic_fallback_is_tagged_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path(), "yahoo_finance:.NS");
        let loaded =
            load_series("FAKE", Some(&cache), Some(&FailingProvider), &opts(false, true)).unwrap();

        assert_eq!(loaded.source, DataSource::Synthetic);
        assert!(!loaded.bars.is_empty());
        assert_eq!(cache.covers_range("FAKE", d(2), d(5)), CoverageResult::NotCached);
    }

    #[test]
    fn offline_uses_partial_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path(), "yahoo_finance:.NS");
        cache
            .write("SBIN", &sample_bars()[..2], DataSource::YahooFinance)
            .unwrap();

        let loaded = load_series("SBIN", Some(&cache), None, &opts(true, false)).unwrap();
        assert_eq!(loaded.source, DataSource::Cache);
        assert_eq!(loaded.bars.len(), 2);
    }
}
