//! History request: what to fetch and how to shape it.

use super::interval::Interval;
use super::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single-symbol history request.
///
/// `start` is inclusive and `end` is exclusive, so `start == end` is a valid
/// request for zero bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub ticker: Ticker,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    /// Replace OHLC with split/dividend-adjusted values and drop `Adj Close`.
    pub auto_adjust: bool,
    /// Include `Dividends` and `Stock Splits` columns.
    pub actions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

impl HistoryRequest {
    pub fn new(
        ticker: Ticker,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Self, RequestError> {
        if start > end {
            return Err(RequestError::InvertedRange { start, end });
        }
        Ok(Self {
            ticker,
            start,
            end,
            interval,
            auto_adjust: true,
            actions: true,
        })
    }

    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }

    pub fn with_actions(mut self, actions: bool) -> Self {
        self.actions = actions;
        self
    }

    /// True when the window cannot contain any bar.
    pub fn is_empty_range(&self) -> bool {
        self.start == self.end
    }
}
