//! Market data: provider trait, Yahoo client, frame schema

pub mod provider;
pub mod schema;
pub mod yahoo;

pub use provider::{DataError, DataProvider, DataSource, FetchResult, PriceRecord};
pub use schema::{records_to_frame, tag_ticker, FrameSchema, SchemaError};
pub use yahoo::{parse_chart_json, YahooProvider, YahooSettings};
