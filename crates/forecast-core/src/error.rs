use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Failure to obtain a live quote. Every variant is non-fatal for the dashboard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("Market data provider is not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Provider rejected the API key")]
    Unauthorized,

    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl QuoteError {
    /// Stable machine-readable name, used in API payloads and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::NotConfigured => "not_configured",
            QuoteError::Network(_) => "network",
            QuoteError::Timeout => "timeout",
            QuoteError::Unauthorized => "unauthorized",
            QuoteError::TickerNotFound(_) => "ticker_not_found",
            QuoteError::RateLimited => "rate_limited",
            QuoteError::Http { .. } => "http",
            QuoteError::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_error_kinds_are_distinct() {
        let errors = [
            QuoteError::NotConfigured,
            QuoteError::Network("dns".into()),
            QuoteError::Timeout,
            QuoteError::Unauthorized,
            QuoteError::TickerNotFound("TSLA".into()),
            QuoteError::RateLimited,
            QuoteError::Http { status: 500, body: String::new() },
            QuoteError::MalformedResponse("eof".into()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_display_includes_ticker() {
        let err = QuoteError::TickerNotFound("ZZZZ".into());
        assert_eq!(err.to_string(), "Ticker not found: ZZZZ");
    }
}
