//! Rate source abstractions

use crate::core::rate::{CurrencyPair, RateQuote};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("source unreachable: {0}")]
    Unreachable(String),
    #[error("HTTP error: {0}")]
    HttpError(u16),
    #[error("unparsable response: {0}")]
    UnparsableResponse(String),
}

impl SourceError {
    /// Timeouts and connection failures, as opposed to a source that answered badly.
    pub fn is_transport(&self) -> bool {
        matches!(self, SourceError::Timeout | SourceError::Unreachable(_))
    }
}

/// One external rate API answering for a single currency pair.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn source_id(&self) -> &str;

    fn pair(&self) -> CurrencyPair;

    /// Time allowed for a single fetch, including reading the body.
    fn budget(&self) -> Duration;

    async fn fetch_quote(&self) -> Result<RateQuote, SourceError>;
}

/// Fetches a quote, aborting the request once the source's budget runs out.
pub async fn fetch_within(source: &dyn RateSource) -> Result<RateQuote, SourceError> {
    let budget = source.budget();
    match tokio::time::timeout(budget, source.fetch_quote()).await {
        Ok(result) => result,
        Err(_) => {
            debug!(source = source.source_id(), ?budget, "Rate source timed out");
            Err(SourceError::Timeout)
        }
    }
}
