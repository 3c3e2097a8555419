//! Property tests for the accumulation invariants.
//!
//! Uses proptest to verify:
//! 1. Tag completeness: every accumulated row carries the fetched symbol
//! 2. Row preservation: tagging and accumulating never add or drop rows
//! 3. Value preservation: the Close column is the fetched closes, in order

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use pricetape_core::data::provider::{
    DataError, DataProvider, DataSource, FetchResult, PriceRecord,
};
use pricetape_core::data::schema::TICKER;
use pricetape_core::{pipeline, HistoryRequest, Interval, Ticker};

/// Serves a fixed record set for whatever symbol is asked for.
struct InMemoryProvider {
    records: Vec<PriceRecord>,
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn fetch(&self, request: &HistoryRequest) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            ticker: request.ticker.clone(),
            records: self.records.clone(),
            source: DataSource::InMemory,
            exchange_timezone: None,
        })
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_ticker() -> impl Strategy<Value = Ticker> {
    "[A-Z]{1,5}(-[A-Z])?".prop_map(|s| Ticker::parse(&s).unwrap())
}

fn arb_records() -> impl Strategy<Value = Vec<PriceRecord>> {
    prop::collection::vec((10.0..500.0_f64, 0u64..10_000_000), 0..40).prop_map(|rows| {
        let first = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (close, volume))| PriceRecord {
                timestamp: (first + Duration::days(i as i64))
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                adj_close: close,
                volume,
                dividends: 0.0,
                stock_splits: 0.0,
            })
            .collect()
    })
}

fn request_for(ticker: Ticker) -> HistoryRequest {
    HistoryRequest::new(
        ticker,
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 3, 30).unwrap(),
        Interval::Day1,
    )
    .unwrap()
}

proptest! {
    /// Every row in the accumulator is labelled with the requested symbol.
    #[test]
    fn every_row_carries_the_requested_ticker(ticker in arb_ticker(), records in arb_records()) {
        let provider = InMemoryProvider { records };
        let request = request_for(ticker.clone());

        let portfolio = pipeline::run(&provider, &request).unwrap();
        let labels = portfolio.frame().column(TICKER).unwrap().str().unwrap();

        prop_assert_eq!(labels.null_count(), 0);
        for label in labels.into_iter() {
            prop_assert_eq!(label, Some(ticker.as_str()));
        }
    }

    /// Accumulation keeps exactly the fetched rows.
    #[test]
    fn row_count_matches_fetched_records(records in arb_records()) {
        let expected = records.len();
        let provider = InMemoryProvider { records };
        let request = request_for(Ticker::parse("AAPL").unwrap());

        let portfolio = pipeline::run(&provider, &request).unwrap();
        prop_assert_eq!(portfolio.height(), expected);
    }

    /// The output Close column equals the input close values row by row.
    #[test]
    fn close_column_round_trips(records in arb_records()) {
        let closes: Vec<Option<f64>> = records.iter().map(|r| Some(r.close)).collect();
        let provider = InMemoryProvider { records };
        let request = request_for(Ticker::parse("SPY").unwrap());

        let df = pipeline::run(&provider, &request).unwrap().into_frame();
        let got: Vec<Option<f64>> = df.column("Close").unwrap().f64().unwrap().into_iter().collect();
        prop_assert_eq!(got, closes);
    }
}
