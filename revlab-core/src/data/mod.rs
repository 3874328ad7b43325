//! Price series loading, caching, and the symbol universe.

pub mod cache;
pub mod csv_dir;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use cache::{CacheMeta, CoverageResult, ParquetCache};
pub use csv_dir::CsvDirProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::{generate_synthetic_bars, SyntheticProvider};
pub use universe::{Universe, UniverseSource, NSE_FO_LOT_SIZE_URL};
pub use yahoo::YahooProvider;
