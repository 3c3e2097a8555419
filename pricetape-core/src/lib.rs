//! pricetape core: fetch one ticker's price history and accumulate it into a table.
//!
//! - Domain types (ticker, interval, history request)
//! - Data provider trait and the Yahoo Finance chart client
//! - Polars frame construction and ticker tagging
//! - The accumulator and the fetch → tag → accumulate pipeline
//! - TOML configuration and output rendering

pub mod config;
pub mod data;
pub mod domain;
pub mod output;
pub mod pipeline;
pub mod portfolio;

pub use config::{ConfigError, PricetapeConfig};
pub use data::{DataError, DataProvider, YahooProvider};
pub use domain::{HistoryRequest, Interval, Ticker};
pub use output::OutputFormat;
pub use portfolio::PortfolioFrame;
