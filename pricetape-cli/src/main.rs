//! pricetape CLI: fetch one ticker's price history and print it as a table.
//!
//! With no arguments this fetches AAPL daily bars from 2023-01-01 up to
//! 2023-03-30 (exclusive). A TOML config file and individual flags override
//! the defaults, flags taking precedence over the file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use pricetape_core::output::{self, OutputFormat};
use pricetape_core::{pipeline, Interval, PricetapeConfig, YahooProvider};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pricetape",
    about = "pricetape: fetch one ticker's price history and print it"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (e.g., AAPL, BRK-B, ^GSPC). Defaults to AAPL.
    #[arg(long)]
    ticker: Option<String>,

    /// Start date, inclusive (YYYY-MM-DD). Defaults to 2023-01-01.
    #[arg(long)]
    start: Option<String>,

    /// End date, exclusive (YYYY-MM-DD). Defaults to 2023-03-30.
    #[arg(long)]
    end: Option<String>,

    /// Bar size: 1m 2m 5m 15m 30m 60m 90m 1h 1d 5d 1wk 1mo 3mo. Defaults to 1d.
    #[arg(long)]
    interval: Option<Interval>,

    /// Keep raw OHLC and add an "Adj Close" column.
    #[arg(long, default_value_t = false)]
    no_adjust: bool,

    /// Omit the Dividends and Stock Splits columns.
    #[arg(long, default_value_t = false)]
    no_actions: bool,

    /// Output format: table or csv.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Maximum rows shown in table output.
    #[arg(long)]
    max_rows: Option<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    let request = config.to_request()?;
    let provider = YahooProvider::new(&config.yahoo_settings()?)?;

    let portfolio = pipeline::run(&provider, &request)
        .with_context(|| format!("fetching {} history", request.ticker))?;

    if config.output.format == OutputFormat::Table {
        configure_table(config.output.max_rows, portfolio.frame().width());
    }

    let stdout = std::io::stdout();
    output::render(portfolio.frame(), config.output.format, stdout.lock())
        .context("writing output")?;

    Ok(())
}

/// Log to stderr so stdout carries only the table. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then the config file, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<PricetapeConfig> {
    let mut config = match &cli.config {
        Some(path) => PricetapeConfig::from_file(path)?,
        None => PricetapeConfig::default(),
    };

    if let Some(ticker) = &cli.ticker {
        config.request.ticker = ticker.clone();
    }
    if let Some(start) = cli.start.as_deref() {
        config.request.start = parse_date(start).context("--start")?;
    }
    if let Some(end) = cli.end.as_deref() {
        config.request.end = parse_date(end).context("--end")?;
    }
    if let Some(interval) = cli.interval {
        config.request.interval = interval;
    }
    if cli.no_adjust {
        config.request.auto_adjust = false;
    }
    if cli.no_actions {
        config.request.actions = false;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(max_rows) = cli.max_rows {
        config.output.max_rows = max_rows;
    }

    debug!(?config, "resolved configuration");
    Ok(config)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

/// Polars reads its table limits from the environment at print time.
fn configure_table(max_rows: usize, width: usize) {
    std::env::set_var("POLARS_FMT_MAX_ROWS", max_rows.to_string());
    std::env::set_var("POLARS_FMT_MAX_COLS", width.to_string());
}
