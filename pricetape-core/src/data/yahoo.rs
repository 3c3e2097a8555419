//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API, together with the dividend
//! and split events for the same window, and shapes them into
//! [`PriceRecord`]s in exchange-local time.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. Failures are reported once and never retried.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, PriceRecord};
use crate::domain::HistoryRequest;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    events: Option<ChartEvents>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

// An empty window comes back as `"quote": [{}]`.
#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Connection settings for [`YahooProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct YahooSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(settings: &YahooSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a request.
    ///
    /// The end bound is exclusive. A zero-width window is widened by a day so
    /// the API still answers (and still rejects unknown symbols); the extra
    /// bars are dropped again by [`parse_chart_json`].
    fn chart_url(&self, request: &HistoryRequest) -> String {
        let query_end = if request.is_empty_range() {
            request.end.succ_opt().unwrap_or(request.end)
        } else {
            request.end
        };
        format!(
            "{base}/v8/finance/chart/{symbol}\
             ?period1={p1}&period2={p2}&interval={interval}\
             &includePrePost=false&events=div%2Csplits&includeAdjustedClose=true",
            base = self.base_url,
            symbol = request.ticker,
            p1 = midnight_utc(request.start),
            p2 = midnight_utc(query_end),
            interval = request.interval,
        )
    }

    fn fetch_chart(&self, request: &HistoryRequest) -> Result<String, DataError> {
        let url = self.chart_url(request);
        let symbol = request.ticker.as_str();
        debug!(%url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            DataError::NetworkUnreachable(format!("{symbol}: {e}"))
        })?;
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok());
        if let Some(err) = status_error(resp.status(), retry_after, symbol) {
            return Err(err);
        }

        resp.text()
            .map_err(|e| DataError::NetworkUnreachable(format!("{symbol}: reading body: {e}")))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, request: &HistoryRequest) -> Result<FetchResult, DataError> {
        let body = self.fetch_chart(request)?;
        let result = parse_chart_json(request, &body)?;
        info!(
            ticker = %request.ticker,
            rows = result.records.len(),
            timezone = result.exchange_timezone.as_deref().unwrap_or("UTC"),
            "fetched history"
        );
        Ok(result)
    }
}

/// Map a non-success HTTP status to its error. `None` means the body should
/// be parsed; 400 still carries a chart.error body worth surfacing.
fn status_error(status: StatusCode, retry_after: Option<&str>, symbol: &str) -> Option<DataError> {
    if status.is_success() || status == StatusCode::BAD_REQUEST {
        return None;
    }

    let err = if status == StatusCode::NOT_FOUND {
        DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        DataError::RateLimited {
            retry_after_secs: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60),
        }
    } else if status == StatusCode::UNAUTHORIZED {
        DataError::AuthenticationRequired("Yahoo Finance requires authentication".into())
    } else {
        DataError::HttpStatus {
            status: status.as_u16(),
            symbol: symbol.to_string(),
        }
    };
    Some(err)
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Parse a chart API body into records for `request`.
///
/// Rows outside `[start, end)` in exchange-local dates are discarded.
pub fn parse_chart_json(request: &HistoryRequest, body: &str) -> Result<FetchResult, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!(
            "failed to parse response for {}: {e}",
            request.ticker
        ))
    })?;
    parse_response(request, resp)
}

/// Parse the chart API response into PriceRecords.
fn parse_response(request: &HistoryRequest, resp: ChartResponse) -> Result<FetchResult, DataError> {
    let symbol = request.ticker.as_str();

    if let Some(err) = resp.chart.error {
        // Yahoo's answer for a window without sessions.
        if err.code == "Bad Request" && err.description.starts_with("Data doesn't exist") {
            debug!(%symbol, description = %err.description, "no data in window");
            return Ok(empty_result(request, None));
        }
        return Err(if err.code == "Not Found" {
            DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }
        } else {
            DataError::ProviderError {
                code: err.code,
                description: err.description,
            }
        });
    }

    let data = resp
        .chart
        .result
        .ok_or_else(|| DataError::ResponseFormatChanged("empty result with no error".into()))?
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    let (gmtoffset, exchange_timezone) = data
        .meta
        .map(|m| (m.gmtoffset, m.exchange_timezone_name))
        .unwrap_or((0, None));

    // gmtoffset is the offset at response time, so it is only a fallback
    // when the zone name is missing or unknown.
    let zone = exchange_timezone.as_deref().and_then(|name| match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!(%symbol, timezone = name, "unknown exchange timezone; using gmtoffset");
            None
        }
    });

    let to_local = |ts: i64| -> Result<NaiveDateTime, DataError> {
        let utc = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
        Ok(match zone {
            Some(tz) => utc.with_timezone(&tz).naive_local(),
            None => utc.naive_utc() + chrono::Duration::seconds(gmtoffset),
        })
    };

    // No timestamps means no trading days in the window.
    let Some(timestamps) = data.timestamp else {
        debug!(%symbol, "chart has no timestamps; empty window");
        return Ok(empty_result(request, exchange_timezone));
    };

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let events = data.events.unwrap_or_default();
    let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
    for ev in events.dividends.values() {
        *dividends.entry(to_local(ev.date)?.date()).or_insert(0.0) += ev.amount;
    }
    let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
    for ev in events.splits.values() {
        if ev.denominator != 0.0 {
            splits.insert(to_local(ev.date)?.date(), ev.numerator / ev.denominator);
        }
    }
    // Events land on the first bar of their day only.
    let mut seen_days: HashSet<NaiveDate> = HashSet::new();

    let intraday = request.interval.is_intraday();
    let mut records = Vec::with_capacity(timestamps.len());
    let mut partial = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let local = to_local(ts)?;
        let day = local.date();
        if day < request.start || day >= request.end {
            continue;
        }

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();
        let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

        // Skip bars where all OHLCV are None (holidays/non-trading days)
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }
        if open.is_none() || high.is_none() || low.is_none() || close.is_none() {
            partial += 1;
        }

        let first_of_day = seen_days.insert(day);
        let (div, split) = if first_of_day {
            (
                dividends.get(&day).copied().unwrap_or(0.0),
                splits.get(&day).copied().unwrap_or(0.0),
            )
        } else {
            (0.0, 0.0)
        };

        let close = close.unwrap_or(f64::NAN);
        let mut record = PriceRecord {
            timestamp: if intraday { local } else { day.and_time(chrono::NaiveTime::MIN) },
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close,
            adj_close: adj_close.unwrap_or(close),
            volume: volume.unwrap_or(0),
            dividends: div,
            stock_splits: split,
        };
        if request.auto_adjust {
            adjust(&mut record);
        }
        records.push(record);
    }

    if partial > 0 {
        warn!(%symbol, partial, "bars with missing prices kept as NaN");
    }

    Ok(FetchResult {
        ticker: request.ticker.clone(),
        records,
        source: DataSource::YahooFinance,
        exchange_timezone,
    })
}

fn empty_result(request: &HistoryRequest, exchange_timezone: Option<String>) -> FetchResult {
    FetchResult {
        ticker: request.ticker.clone(),
        records: Vec::new(),
        source: DataSource::YahooFinance,
        exchange_timezone,
    }
}

/// Scale OHLC by `adj_close / close`.
fn adjust(record: &mut PriceRecord) {
    let ratio = record.adj_close / record.close;
    if !ratio.is_finite() {
        return;
    }
    record.open *= ratio;
    record.high *= ratio;
    record.low *= ratio;
    record.close = record.adj_close;
}
