//! Fetch → tag → accumulate.

use crate::data::provider::{DataError, DataProvider};
use crate::data::schema::{records_to_frame, tag_ticker, FrameSchema};
use crate::domain::HistoryRequest;
use crate::portfolio::PortfolioFrame;
use tracing::{debug, info};

/// Fetch one symbol's history and return it as a tagged, accumulated table.
///
/// Provider failures propagate unchanged; nothing is retried.
pub fn run(
    provider: &dyn DataProvider,
    request: &HistoryRequest,
) -> Result<PortfolioFrame, DataError> {
    debug!(
        provider = provider.name(),
        ticker = %request.ticker,
        start = %request.start,
        end = %request.end,
        interval = %request.interval,
        "fetching history"
    );

    let fetched = provider.fetch(request)?;
    if fetched.ticker != request.ticker {
        return Err(DataError::ResponseFormatChanged(format!(
            "requested {} but provider answered for {}",
            request.ticker, fetched.ticker
        )));
    }

    let frame = records_to_frame(&fetched.records, request)?;
    let tagged = tag_ticker(frame, &request.ticker)?;
    FrameSchema::validate(&tagged, &FrameSchema::tagged_schema(request))?;

    let mut portfolio = PortfolioFrame::new();
    portfolio.append(tagged)?;

    info!(
        ticker = %request.ticker,
        rows = portfolio.height(),
        source = ?fetched.source,
        "accumulated history"
    );
    Ok(portfolio)
}
