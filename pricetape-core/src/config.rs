//! TOML configuration.
//!
//! Every field is optional; anything left out falls back to the built-in
//! defaults, which fetch `AAPL` daily bars for 2023-01-01 up to (not
//! including) 2023-03-30.

use crate::data::yahoo::{YahooSettings, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::domain::{HistoryRequest, Interval, Ticker};
use crate::output::OutputFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TICKER: &str = "AAPL";

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, 30).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricetapeConfig {
    pub request: RequestConfig,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    pub ticker: String,
    /// Inclusive.
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub interval: Interval,
    pub auto_adjust: bool,
    pub actions: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            start: default_start(),
            end: default_end(),
            interval: Interval::Day1,
            auto_adjust: true,
            actions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Row limit for table output; longer tables are elided in the middle.
    pub max_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            max_rows: 100,
        }
    }
}

impl PricetapeConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the request section into a [`HistoryRequest`].
    pub fn to_request(&self) -> Result<HistoryRequest, ConfigError> {
        let r = &self.request;
        let ticker = Ticker::parse(&r.ticker).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let request = HistoryRequest::new(ticker, r.start, r.end, r.interval)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(request
            .with_auto_adjust(r.auto_adjust)
            .with_actions(r.actions))
    }

    pub fn yahoo_settings(&self) -> Result<YahooSettings, ConfigError> {
        let p = &self.provider;
        if p.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
        }
        if !(p.base_url.starts_with("http://") || p.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "provider.base_url must be an http(s) URL, got '{}'",
                p.base_url
            )));
        }
        Ok(YahooSettings {
            base_url: p.base_url.clone(),
            timeout: Duration::from_secs(p.timeout_secs),
            user_agent: p.user_agent.clone(),
        })
    }
}
