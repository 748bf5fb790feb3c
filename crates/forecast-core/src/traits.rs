use async_trait::async_trait;
use crate::{LatestQuote, QuoteError};

/// Source of the most recent daily close for a ticker.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn latest_close(&self, ticker: &str) -> Result<LatestQuote, QuoteError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &str;
}
