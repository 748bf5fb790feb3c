//! Server configuration from environment variables.
//!
//! `.env` is loaded by `run_server` before anything here is read. Malformed
//! values fall back to their defaults with a warning instead of aborting
//! startup.

use ipo_simulator::SimulationSettings;
use polygon_client::PolygonConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_QUOTE_TICKER: &str = "TSLA";
const MAX_SIMULATION_RUNS: usize = 200_000;
const MAX_HISTOGRAM_BINS: usize = 200;

/// Read before the rest of the config so startup warnings are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub polygon: PolygonConfig,
    pub quote_ticker: String,
    pub quote_cache_ttl: Duration,
    pub simulation: SimulationSettings,
    /// Empty means same-origin only
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            polygon: PolygonConfig::default(),
            quote_ticker: DEFAULT_QUOTE_TICKER.to_string(),
            quote_cache_ttl: Duration::from_secs(60),
            simulation: SimulationSettings::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut polygon = PolygonConfig::from_env();
        polygon.timeout = Duration::from_secs(env_or("QUOTE_TIMEOUT_SECS", polygon.timeout.as_secs()).max(1));

        let simulation = SimulationSettings {
            runs: env_or("SIMULATION_RUNS", defaults.simulation.runs).clamp(1, MAX_SIMULATION_RUNS),
            bins: env_or("HISTOGRAM_BINS", defaults.simulation.bins).clamp(1, MAX_HISTOGRAM_BINS),
            assumptions: defaults.simulation.assumptions,
        };

        let quote_ticker = std::env::var("QUOTE_TICKER")
            .ok()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .unwrap_or(defaults.quote_ticker);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            polygon,
            quote_ticker,
            quote_cache_ttl: Duration::from_secs(env_or("QUOTE_CACHE_TTL_SECS", defaults.quote_cache_ttl.as_secs())),
            simulation,
            cors_allowed_origins,
        }
    }
}

/// Parse `key` into `T`, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("Ignoring malformed {}={:?}, using default", key, raw);
            default
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
