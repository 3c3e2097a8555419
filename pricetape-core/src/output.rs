//! Rendering the accumulated table.

use crate::data::provider::DataError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Comma-separated with a header row.
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format '{0}' (expected table or csv)")]
pub struct OutputFormatError(pub String);

impl FromStr for OutputFormat {
    type Err = OutputFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(OutputFormatError(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => f.write_str("table"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Write `frame` to `out` in the requested format.
pub fn render<W: Write>(frame: &DataFrame, format: OutputFormat, mut out: W) -> Result<(), DataError> {
    match format {
        OutputFormat::Table => writeln!(out, "{frame}")
            .map_err(|e| DataError::Output(format!("write table: {e}")))?,
        OutputFormat::Csv => CsvWriter::new(&mut out)
            .include_header(true)
            .finish(&mut frame.clone())
            .map_err(|e| DataError::Output(format!("write csv: {e}")))?,
    }
    out.flush()
        .map_err(|e| DataError::Output(format!("flush: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Close".into(), &[125.5, 126.25]),
            Column::new("Ticker".into(), &["AAPL", "AAPL"]),
        ])
        .unwrap()
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("json".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let mut buf = Vec::new();
        render(&frame(), OutputFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["Close,Ticker", "125.5,AAPL", "126.25,AAPL"]);
    }

    #[test]
    fn table_mentions_every_ticker_and_column() {
        let mut buf = Vec::new();
        render(&frame(), OutputFormat::Table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Close"));
        assert!(text.contains("Ticker"));
        assert!(text.contains("AAPL"));
        assert!(text.contains("shape: (2, 2)"));
    }
}
