//! Domain types for pricetape

pub mod interval;
pub mod request;
pub mod ticker;

pub use interval::{Interval, IntervalError};
pub use request::{HistoryRequest, RequestError};
pub use ticker::{Ticker, TickerError};
