use chrono::{DateTime, Utc};
use dashmap::DashMap;
use forecast_core::{QuoteError, QuoteProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Failed lookups are retried sooner than successful ones are refreshed.
const MAX_FAILURE_TTL: Duration = Duration::from_secs(15);

/// What the quote panel shows: a price, or a non-fatal warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteStatus {
    Available {
        ticker: String,
        close: f64,
        as_of: Option<DateTime<Utc>>,
        provider: String,
    },
    Unavailable {
        ticker: String,
        /// Machine-readable error kind
        reason: String,
        warning: String,
        detail: String,
    },
}

impl QuoteStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, QuoteStatus::Available { .. })
    }

    fn unavailable(ticker: &str, err: &QuoteError) -> Self {
        QuoteStatus::Unavailable {
            ticker: ticker.to_string(),
            reason: err.kind().to_string(),
            warning: format!("Could not fetch live {} price in this environment.", ticker),
            detail: err.to_string(),
        }
    }
}

struct CachedQuote {
    status: QuoteStatus,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedQuote {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Fetches the live quote through a [`QuoteProvider`] with a per-ticker TTL cache.
pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    default_ticker: String,
    ttl: Duration,
    cache: DashMap<String, CachedQuote>,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>, default_ticker: String, ttl: Duration) -> Self {
        Self {
            provider,
            default_ticker,
            ttl,
            cache: DashMap::new(),
        }
    }

    /// Quote status for the configured ticker.
    pub async fn status(&self) -> QuoteStatus {
        self.status_for(&self.default_ticker).await
    }

    /// Never fails: provider errors become [`QuoteStatus::Unavailable`].
    pub async fn status_for(&self, ticker: &str) -> QuoteStatus {
        let cached = self
            .cache
            .get(ticker)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.status.clone());
        if let Some(status) = cached {
            return status;
        }

        let status = match self.provider.latest_close(ticker).await {
            Ok(quote) => {
                tracing::info!(
                    "Fetched {} close ${:.2} from {}",
                    quote.ticker,
                    quote.close,
                    self.provider.provider_name()
                );
                QuoteStatus::Available {
                    ticker: quote.ticker,
                    close: quote.close,
                    as_of: quote.as_of,
                    provider: self.provider.provider_name().to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    ticker,
                    kind = e.kind(),
                    "Quote fetch failed, continuing without live price: {}",
                    e
                );
                QuoteStatus::unavailable(ticker, &e)
            }
        };

        let ttl = if status.is_available() {
            self.ttl
        } else {
            self.ttl.min(MAX_FAILURE_TTL)
        };
        self.cache.insert(
            ticker.to_string(),
            CachedQuote {
                status: status.clone(),
                fetched_at: Instant::now(),
                ttl,
            },
        );

        status
    }
}
