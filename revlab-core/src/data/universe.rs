//! Symbol universe: which tickers a batch runs over.
//!
//! The primary source is the NSE F&O market-lot CSV, whose `SYMBOL` column
//! lists every derivatives-eligible stock. When that download fails the
//! universe falls back to a fixed large-cap list so the batch still runs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use super::provider::DataError;

pub const NSE_FO_LOT_SIZE_URL: &str = "https://archives.nseindia.com/content/fo/fo_mktlots.csv";

const FALLBACK: [&str; 8] = [
    "RELIANCE",
    "TCS",
    "INFY",
    "ICICIBANK",
    "HDFCBANK",
    "SBIN",
    "HINDUNILVR",
    "ITC",
];

const NIFTY50: [&str; 49] = [
    "RELIANCE", "TCS", "INFY", "HDFCBANK", "ICICIBANK", "SBIN", "ITC", "HINDUNILVR", "LT",
    "KOTAKBANK", "AXISBANK", "BAJFINANCE", "BHARTIARTL", "MARUTI", "TITAN", "ASIANPAINT",
    "SUNPHARMA", "WIPRO", "TECHM", "NESTLEIND", "ULTRACEMCO", "TATASTEEL", "NTPC", "POWERGRID",
    "HCLTECH", "INDUSINDBK", "CIPLA", "GRASIM", "BAJAJFINSV", "COALINDIA", "TATAMOTORS",
    "JSWSTEEL", "HINDALCO", "BPCL", "ONGC", "DRREDDY", "BRITANNIA", "DIVISLAB", "EICHERMOT",
    "BAJAJ_AUTO", "SBILIFE", "HDFCLIFE", "HEROMOTOCO", "ADANIPORTS", "APOLLOHOSP", "UPL",
    "ICICIPRULI", "TATACONSUM", "SHREECEM",
];

/// Where the symbol list comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UniverseSource {
    /// NSE market-lot CSV, falling back to the built-in list on failure.
    Remote {
        #[serde(default = "default_url")]
        url: String,
    },
    Nifty50,
    Fallback,
    List { symbols: Vec<String> },
}

fn default_url() -> String {
    NSE_FO_LOT_SIZE_URL.to_string()
}

impl Default for UniverseSource {
    fn default() -> Self {
        UniverseSource::Remote { url: default_url() }
    }
}

/// An ordered, de-duplicated list of bare symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub symbols: Vec<String>,
    /// True when the requested source failed and the fallback list was used.
    #[serde(default)]
    pub is_fallback: bool,
}

impl Universe {
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let symbols = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        Self {
            symbols,
            is_fallback: false,
        }
    }

    /// Built-in F&O large-cap list.
    pub fn fallback() -> Self {
        Self {
            is_fallback: true,
            ..Self::from_symbols(FALLBACK)
        }
    }

    pub fn nifty50() -> Self {
        Self::from_symbols(NIFTY50)
    }

    /// Parse the NSE market-lot CSV: first-seen order of the `SYMBOL` column.
    pub fn from_lot_size_csv(content: &str) -> Result<Self, DataError> {
        let malformed = |reason: String| DataError::Malformed {
            path: "lot-size csv".into(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers().map_err(|e| malformed(e.to_string()))?;
        let column = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("SYMBOL"))
            .ok_or_else(|| malformed("no SYMBOL column".into()))?;

        let mut symbols = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            // Section rows repeat the header text in the SYMBOL column
            match record.get(column) {
                Some(symbol) if !symbol.eq_ignore_ascii_case("SYMBOL") => {
                    symbols.push(symbol.to_string())
                }
                _ => {}
            }
        }

        let universe = Self::from_symbols(symbols);
        if universe.symbols.is_empty() {
            return Err(malformed("SYMBOL column is empty".into()));
        }
        Ok(universe)
    }

    /// Download and parse the market-lot CSV.
    pub fn fetch_remote(url: &str) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        let resp = client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for {url}")));
        }
        let body = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;
        Self::from_lot_size_csv(&body)
    }

    /// Resolve a source. A remote failure degrades to the fallback list.
    pub fn resolve(source: &UniverseSource) -> Self {
        match source {
            UniverseSource::Remote { url } => Self::fetch_remote(url).unwrap_or_else(|e| {
                tracing::warn!(%url, error = %e, "universe download failed, using fallback list");
                Self::fallback()
            }),
            UniverseSource::Nifty50 => Self::nifty50(),
            UniverseSource::Fallback => Self::fallback(),
            UniverseSource::List { symbols } => Self::from_symbols(symbols),
        }
    }

    /// Keep at most `max` symbols, in order.
    pub fn truncate(mut self, max: usize) -> Self {
        self.symbols.truncate(max);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
