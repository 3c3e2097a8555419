use super::provider::{DataError, PriceRecord};
use crate::domain::{HistoryRequest, Ticker};
use chrono::NaiveDate;
use polars::prelude::*;

pub const DATE: &str = "Date";
pub const DATETIME: &str = "Datetime";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "Adj Close";
pub const VOLUME: &str = "Volume";
pub const DIVIDENDS: &str = "Dividends";
pub const STOCK_SPLITS: &str = "Stock Splits";
pub const TICKER: &str = "Ticker";

/// Expected layout of a price frame for a given request.
pub struct FrameSchema;

impl FrameSchema {
    /// Untagged schema, in column order.
    pub fn schema(request: &HistoryRequest) -> Schema {
        let mut fields = Vec::with_capacity(10);
        if request.interval.is_intraday() {
            fields.push(Field::new(
                DATETIME.into(),
                DataType::Datetime(TimeUnit::Milliseconds, None),
            ));
        } else {
            fields.push(Field::new(DATE.into(), DataType::Date));
        }
        for name in [OPEN, HIGH, LOW, CLOSE] {
            fields.push(Field::new(name.into(), DataType::Float64));
        }
        if !request.auto_adjust {
            fields.push(Field::new(ADJ_CLOSE.into(), DataType::Float64));
        }
        fields.push(Field::new(VOLUME.into(), DataType::UInt64));
        if request.actions {
            fields.push(Field::new(DIVIDENDS.into(), DataType::Float64));
            fields.push(Field::new(STOCK_SPLITS.into(), DataType::Float64));
        }
        Schema::from_iter(fields)
    }

    /// Schema after [`tag_ticker`].
    pub fn tagged_schema(request: &HistoryRequest) -> Schema {
        let mut schema = Self::schema(request);
        schema.with_column(TICKER.into(), DataType::String);
        schema
    }

    /// Validate DataFrame against an expected schema
    pub fn validate(df: &DataFrame, expected: &Schema) -> Result<(), SchemaError> {
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

/// Convert fetched records into a typed frame shaped by `request`.
pub fn records_to_frame(
    records: &[PriceRecord],
    request: &HistoryRequest,
) -> Result<DataFrame, DataError> {
    let mut columns = Vec::with_capacity(10);

    if request.interval.is_intraday() {
        let millis: Vec<i64> = records
            .iter()
            .map(|r| r.timestamp.and_utc().timestamp_millis())
            .collect();
        columns.push(
            Column::new(DATETIME.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        );
    } else {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let days: Vec<i32> = records
            .iter()
            .map(|r| (r.timestamp.date() - epoch).num_days() as i32)
            .collect();
        columns.push(Column::new(DATE.into(), days).cast(&DataType::Date)?);
    }

    let float_col = |name: &str, f: fn(&PriceRecord) -> f64| {
        Column::new(name.into(), records.iter().map(f).collect::<Vec<f64>>())
    };

    columns.push(float_col(OPEN, |r| r.open));
    columns.push(float_col(HIGH, |r| r.high));
    columns.push(float_col(LOW, |r| r.low));
    columns.push(float_col(CLOSE, |r| r.close));
    if !request.auto_adjust {
        columns.push(float_col(ADJ_CLOSE, |r| r.adj_close));
    }
    columns.push(Column::new(
        VOLUME.into(),
        records.iter().map(|r| r.volume).collect::<Vec<u64>>(),
    ));
    if request.actions {
        columns.push(float_col(DIVIDENDS, |r| r.dividends));
        columns.push(float_col(STOCK_SPLITS, |r| r.stock_splits));
    }

    Ok(DataFrame::new(columns)?)
}

/// Add a `Ticker` column holding `ticker` on every row.
///
/// Works on zero-row frames: the column is created with no values.
pub fn tag_ticker(mut df: DataFrame, ticker: &Ticker) -> Result<DataFrame, DataError> {
    let labels = vec![ticker.as_str(); df.height()];
    df.with_column(Column::new(TICKER.into(), labels))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;

    fn request() -> HistoryRequest {
        HistoryRequest::new(
            Ticker::parse("AAPL").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 30).unwrap(),
            Interval::Day1,
        )
        .unwrap()
    }

    fn record(day: u32, close: f64) -> PriceRecord {
        PriceRecord {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: close,
            volume: 1000,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    #[test]
    fn default_schema_matches_history_layout() {
        let names: Vec<String> = FrameSchema::schema(&request())
            .iter_names()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            ["Date", "Open", "High", "Low", "Close", "Volume", "Dividends", "Stock Splits"]
        );
    }

    #[test]
    fn unadjusted_schema_keeps_adj_close_and_drops_actions() {
        let req = request().with_auto_adjust(false).with_actions(false);
        let schema = FrameSchema::schema(&req);
        assert!(schema.contains(ADJ_CLOSE));
        assert!(!schema.contains(DIVIDENDS));
        assert!(!schema.contains(STOCK_SPLITS));
    }

    #[test]
    fn records_build_a_frame_that_validates() {
        let req = request();
        let df = records_to_frame(&[record(3, 125.0), record(4, 126.0)], &req).unwrap();
        assert_eq!(df.height(), 2);
        FrameSchema::validate(&df, &FrameSchema::schema(&req)).unwrap();

        let closes: Vec<Option<f64>> = df.column(CLOSE).unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(closes, vec![Some(125.0), Some(126.0)]);
    }

    #[test]
    fn empty_records_build_an_empty_typed_frame() {
        let req = request();
        let df = records_to_frame(&[], &req).unwrap();
        assert_eq!(df.height(), 0);
        FrameSchema::validate(&df, &FrameSchema::schema(&req)).unwrap();
    }

    #[test]
    fn tag_labels_every_row() {
        let req = request();
        let df = records_to_frame(&[record(3, 125.0), record(4, 126.0)], &req).unwrap();
        let tagged = tag_ticker(df, &req.ticker).unwrap();

        let labels: Vec<Option<&str>> = tagged.column(TICKER).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some("AAPL"), Some("AAPL")]);
        FrameSchema::validate(&tagged, &FrameSchema::tagged_schema(&req)).unwrap();
    }

    #[test]
    fn tag_on_empty_frame_adds_column() {
        let req = request();
        let tagged = tag_ticker(records_to_frame(&[], &req).unwrap(), &req.ticker).unwrap();
        assert_eq!(tagged.height(), 0);
        assert_eq!(tagged.column(TICKER).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn validate_rejects_missing_column() {
        let req = request();
        let df = records_to_frame(&[record(3, 125.0)], &req).unwrap();
        let err = FrameSchema::validate(&df, &FrameSchema::tagged_schema(&req)).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == TICKER));
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let df = DataFrame::new(vec![Column::new(DATE.into(), &["2023-01-03"])]).unwrap();
        let err = FrameSchema::validate(&df, &FrameSchema::schema(&request())).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn schema_errors_surface_as_data_errors() {
        let req = request();
        let df = records_to_frame(&[record(3, 125.0)], &req).unwrap();
        let err: crate::data::provider::DataError =
            FrameSchema::validate(&df, &FrameSchema::tagged_schema(&req))
                .unwrap_err()
                .into();
        assert!(matches!(
            err,
            crate::data::provider::DataError::Schema(SchemaError::MissingColumn(_))
        ));
    }

    #[test]
    fn intraday_frames_use_datetime_column() {
        let req = HistoryRequest::new(
            Ticker::parse("AAPL").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 4).unwrap(),
            Interval::Minute5,
        )
        .unwrap();
        let df = records_to_frame(&[record(3, 125.0)], &req).unwrap();
        assert!(df.column(DATETIME).is_ok());
        assert!(df.column(DATE).is_err());
    }
}
