//! IpoScope dashboard server.
//!
//! Serves the embedded single-page dashboard and the JSON, SVG and CSV
//! endpoints it calls. Every request re-evaluates the scenarios from its
//! query string; the only shared state is the quote provider and its cache.

pub mod chart_routes;
pub mod config;
pub mod dashboard_routes;
mod embedded_frontend;
pub mod export_routes;
pub mod params;
pub mod quote_routes;
pub mod quote_service;
mod request_id;
mod security_headers;


use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use forecast_core::{DashboardInputs, ForecastError, QuoteProvider};
use ipo_simulator::{evaluate, Evaluation};
use polygon_client::PolygonClient;
use report_export::ExportError;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{LogFormat, ServerConfig};
use quote_service::QuoteService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub quotes: Arc<QuoteService>,
}

impl AppState {
    pub fn new(config: ServerConfig, provider: Arc<dyn QuoteProvider>) -> Self {
        let quotes = QuoteService::new(provider, config.quote_ticker.clone(), config.quote_cache_ttl);
        Self {
            config: Arc::new(config),
            quotes: Arc::new(quotes),
        }
    }
}

/// JSON envelope shared by every API endpoint
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error carrying the HTTP status it maps to.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let status = match err {
            ForecastError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ForecastError::InvalidDistribution(_) | ForecastError::InsufficientData(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        anyhow::Error::new(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        } else {
            tracing::warn!("Rejected request ({}): {}", self.status.as_u16(), self.message);
        }
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

/// Evaluate the scenarios off the async workers.
pub async fn run_evaluation(
    state: &AppState,
    inputs: DashboardInputs,
    seed: u64,
) -> Result<Evaluation, AppError> {
    let settings = state.config.simulation.clone();
    let evaluation = tokio::task::spawn_blocking(move || evaluate(&inputs, &settings, seed))
        .await
        .map_err(|e| anyhow::anyhow!("Simulation task failed: {}", e))??;
    Ok(evaluation)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .merge(dashboard_routes::dashboard_routes())
        .merge(quote_routes::quote_routes())
        .merge(chart_routes::chart_routes())
        .merge(export_routes::export_routes())
        .fallback(embedded_frontend::serve_frontend)
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
        .with_state(state)
}

pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "dashboard_server=info,polygon_client=info,ipo_simulator=info,tower_http=info".into()
    });
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let config = ServerConfig::from_env();
    let polygon = PolygonClient::new(config.polygon.clone());
    if !polygon.is_configured() {
        tracing::warn!("POLYGON_API_KEY not set; the live quote panel will show a warning");
    }

    tracing::info!(
        "Simulation: {} runs, {} bins; quote ticker {}",
        config.simulation.runs,
        config.simulation.bins,
        config.quote_ticker
    );

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, Arc::new(polygon));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
