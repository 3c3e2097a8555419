//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the market-data source so the
//! pipeline can run against Yahoo Finance in production and an in-memory
//! series in tests.

use super::schema::SchemaError;
use crate::domain::{HistoryRequest, Ticker};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One bar as returned by a provider, timestamped in exchange-local time.
///
/// `open`/`high`/`low`/`close` are already adjusted when the request asked for
/// auto-adjust; `adj_close` always holds the provider's adjusted close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
    pub dividends: f64,
    pub stock_splits: f64,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol} (possibly delisted)")]
    SymbolNotFound { symbol: String },

    #[error("provider error {code}: {description}")]
    ProviderError { code: String, description: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("frame schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("frame error: {0}")]
    Frame(String),

    #[error("output error: {0}")]
    Output(String),
}

impl From<polars::prelude::PolarsError> for DataError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        DataError::Frame(e.to_string())
    }
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: Ticker,
    pub records: Vec<PriceRecord>,
    pub source: DataSource,
    /// IANA name of the exchange timezone, when the provider reports one.
    pub exchange_timezone: Option<String>,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    InMemory,
}

/// Trait for market-data providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the bars described by `request`.
    ///
    /// A window with no trading days yields `Ok` with no records; an unknown
    /// symbol must be an error, never an empty result.
    fn fetch(&self, request: &HistoryRequest) -> Result<FetchResult, DataError>;
}
