use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forecast_core::{LatestQuote, QuoteError, QuoteProvider};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
/// Free tier allows 5 requests per minute.
pub const DEFAULT_RATE_LIMIT: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
///
/// Fails fast instead of sleeping so a slow window never stalls a page render.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut ts = self.timestamps.lock().await;
        let now = Instant::now();

        while let Some(&front) = ts.front() {
            if now.duration_since(front) >= self.window {
                ts.pop_front();
            } else {
                break;
            }
        }

        if ts.len() < self.max_requests {
            ts.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Connection settings for [`PolygonClient`]
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    /// Requests allowed per minute
    pub rate_limit: usize,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl PolygonConfig {
    /// Read `POLYGON_API_KEY`, `POLYGON_BASE_URL` and `POLYGON_RATE_LIMIT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("POLYGON_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let base_url = std::env::var("POLYGON_BASE_URL").unwrap_or(defaults.base_url);
        let rate_limit = std::env::var("POLYGON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit);

        Self {
            api_key,
            base_url,
            timeout: defaults.timeout,
            rate_limit,
        }
    }
}

/// Latest-close quote fetcher backed by Polygon's previous-day aggregate.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(config: PolygonConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            rate_limiter: RateLimiter::new(config.rate_limit, Duration::from_secs(60)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(PolygonConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get the most recent daily close for `ticker`.
    pub async fn get_previous_close(&self, ticker: &str) -> Result<LatestQuote, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::NotConfigured)?;

        let symbol = ticker.trim().to_uppercase();
        if symbol.is_empty()
            || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(QuoteError::TickerNotFound(ticker.to_string()));
        }

        if !self.rate_limiter.try_acquire().await {
            tracing::debug!("Rate limiter: no Polygon slot free for {}", symbol);
            return Err(QuoteError::RateLimited);
        }

        let url = format!("{}/v2/aggs/ticker/{}/prev", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("adjusted", "true"), ("apiKey", api_key)])
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;

        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(QuoteError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(QuoteError::TickerNotFound(symbol)),
            StatusCode::TOO_MANY_REQUESTS => return Err(QuoteError::RateLimited),
            s => {
                return Err(QuoteError::Http {
                    status: s.as_u16(),
                    body: truncate(&body, 200),
                })
            }
        }

        parse_previous_close(&symbol, &body)
    }
}

#[async_trait]
impl QuoteProvider for PolygonClient {
    async fn latest_close(&self, ticker: &str) -> Result<LatestQuote, QuoteError> {
        self.get_previous_close(ticker).await
    }

    fn provider_name(&self) -> &str {
        "polygon"
    }
}

fn classify_transport_error(e: reqwest::Error) -> QuoteError {
    if e.is_timeout() {
        QuoteError::Timeout
    } else if e.is_decode() {
        QuoteError::MalformedResponse(e.to_string())
    } else {
        QuoteError::Network(e.to_string())
    }
}

fn parse_previous_close(symbol: &str, body: &str) -> Result<LatestQuote, QuoteError> {
    let parsed: PrevCloseResponse =
        serde_json::from_str(body).map_err(|e| QuoteError::MalformedResponse(e.to_string()))?;

    let bar = match parsed.results.last() {
        Some(bar) => bar,
        None => return Err(QuoteError::TickerNotFound(symbol.to_string())),
    };

    let close = bar
        .c
        .filter(|c| c.is_finite())
        .ok_or_else(|| QuoteError::MalformedResponse("result has no close price".to_string()))?;

    Ok(LatestQuote {
        ticker: bar.ticker.clone().unwrap_or_else(|| symbol.to_string()),
        close,
        as_of: bar.t.and_then(DateTime::<Utc>::from_timestamp_millis),
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// Previous close types
#[derive(Debug, Deserialize)]
struct PrevCloseResponse {
    #[serde(default)]
    results: Vec<PrevCloseBar>,
}

#[derive(Debug, Deserialize)]
struct PrevCloseBar {
    #[serde(rename = "T")]
    ticker: Option<String>,
    c: Option<f64>,
    t: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response},
        routing::get,
        Router,
    };
    use std::collections::HashMap;

    const TEST_KEY: &str = "test-key";

    async fn prev_close(
        Path(ticker): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if params.get("apiKey").map(String::as_str) != Some(TEST_KEY) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        match ticker.as_str() {
            "TSLA" => (
                AxumStatus::OK,
                r#"{"ticker":"TSLA","resultsCount":1,"status":"OK","results":[{"T":"TSLA","o":240.1,"c":248.5,"h":251.0,"l":238.2,"v":1.0e8,"t":1760659200000}]}"#,
            )
                .into_response(),
            "NOPE" => (AxumStatus::OK, r#"{"ticker":"NOPE","resultsCount":0,"status":"OK"}"#).into_response(),
            "NULL" => (AxumStatus::OK, r#"{"results":[{"T":"NULL","c":null}]}"#).into_response(),
            "JUNK" => (AxumStatus::OK, "<html>maintenance</html>").into_response(),
            "BUSY" => AxumStatus::TOO_MANY_REQUESTS.into_response(),
            "FAIL" => (AxumStatus::BAD_GATEWAY, "upstream down").into_response(),
            "SLOW" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                AxumStatus::OK.into_response()
            }
            _ => AxumStatus::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/v2/aggs/ticker/:ticker/prev", get(prev_close));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> PolygonClient {
        PolygonClient::new(PolygonConfig {
            api_key: Some(TEST_KEY.to_string()),
            base_url,
            timeout: Duration::from_millis(500),
            rate_limit: 100,
        })
    }

    #[tokio::test]
    async fn test_previous_close() {
        let client = client_for(spawn_stub().await);
        let quote = client.get_previous_close("tsla").await.unwrap();

        assert_eq!(quote.ticker, "TSLA");
        assert_eq!(quote.close, 248.5);
        assert_eq!(quote.as_of.unwrap().timestamp_millis(), 1_760_659_200_000);
    }

    #[tokio::test]
    async fn test_error_classification() {
        let client = client_for(spawn_stub().await);

        let cases = [
            ("NOPE", "ticker_not_found"),
            ("MISSING", "ticker_not_found"),
            ("NULL", "malformed_response"),
            ("JUNK", "malformed_response"),
            ("BUSY", "rate_limited"),
            ("FAIL", "http"),
            ("SLOW", "timeout"),
        ];
        for (ticker, kind) in cases {
            let err = client.get_previous_close(ticker).await.unwrap_err();
            assert_eq!(err.kind(), kind, "{} gave {:?}", ticker, err);
        }
    }

    #[tokio::test]
    async fn test_bad_key_is_unauthorized() {
        let mut client = client_for(spawn_stub().await);
        client.api_key = Some("wrong".to_string());
        let err = client.get_previous_close("TSLA").await.unwrap_err();
        assert_eq!(err, QuoteError::Unauthorized);
    }

    #[tokio::test]
    async fn test_not_configured() {
        let client = PolygonClient::new(PolygonConfig::default());
        assert!(!client.is_configured());
        let err = client.latest_close("TSLA").await.unwrap_err();
        assert_eq!(err, QuoteError::NotConfigured);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network() {
        // Nothing listens on port 1
        let client = client_for("http://127.0.0.1:1".to_string());
        let err = client.get_previous_close("TSLA").await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn test_invalid_ticker_rejected_locally() {
        let client = client_for("http://127.0.0.1:1".to_string());
        let err = client.get_previous_close("TS LA/../x").await.unwrap_err();
        assert!(matches!(err, QuoteError::TickerNotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limiter_fails_fast() {
        let mut config = PolygonConfig {
            api_key: Some(TEST_KEY.to_string()),
            base_url: spawn_stub().await,
            ..PolygonConfig::default()
        };
        config.rate_limit = 1;
        let client = PolygonClient::new(config);

        assert!(client.get_previous_close("TSLA").await.is_ok());
        let err = client.get_previous_close("TSLA").await.unwrap_err();
        assert_eq!(err, QuoteError::RateLimited);
    }

    #[test]
    fn test_parse_uses_last_result() {
        let body = r#"{"results":[{"c":1.0},{"T":"TSLA","c":2.5}]}"#;
        let quote = parse_previous_close("TSLA", body).unwrap();
        assert_eq!(quote.close, 2.5);
        assert!(quote.as_of.is_none());
    }
}
