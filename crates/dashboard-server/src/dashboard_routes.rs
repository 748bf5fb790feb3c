//! Dashboard API Routes
//!
//! The full page snapshot plus the pieces it is made of.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use forecast_core::{sample_headlines, DashboardInputs, NewsItem, ScenarioPrices};
use ipo_simulator::{Evaluation, Histogram, MarketCapForecast, PriceSummary};
use serde::Serialize;

use crate::params::{to_query_string, DashboardQuery};
use crate::quote_service::QuoteStatus;
use crate::{run_evaluation, ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct InputsView {
    pub bear_probability: f64,
    pub base_probability: f64,
    pub bull_probability: f64,
    pub prices: ScenarioPrices,
    pub impact: String,
    pub impact_label: String,
    pub impact_factor: f64,
    pub adoption_speed: u32,
}

#[derive(Serialize)]
pub struct ScenarioCounts {
    pub bear: usize,
    pub base: usize,
    pub bull: usize,
}

#[derive(Serialize)]
pub struct SimulationView {
    pub seed: u64,
    pub runs: usize,
    pub expected_price: f64,
    pub analytic_expected_price: f64,
    pub scenario_counts: ScenarioCounts,
    pub summary: PriceSummary,
    pub histogram: Histogram,
}

#[derive(Serialize)]
pub struct ArtifactLinks {
    pub distribution_chart: String,
    pub forecast_chart: String,
    pub csv_export: String,
}

#[derive(Serialize)]
pub struct DashboardSnapshot {
    pub inputs: InputsView,
    pub simulation: SimulationView,
    pub forecast: MarketCapForecast,
    pub quote: QuoteStatus,
    pub news: Vec<NewsItem>,
    pub links: ArtifactLinks,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/simulation", get(get_simulation))
        .route("/api/forecast", get(get_forecast))
        .route("/api/news", get(get_news))
}

fn inputs_view(inputs: &DashboardInputs, bull_probability: f64) -> InputsView {
    InputsView {
        bear_probability: inputs.bear_probability,
        base_probability: inputs.base_probability,
        bull_probability,
        prices: inputs.prices,
        impact: inputs.impact.key().to_string(),
        impact_label: inputs.impact.label().to_string(),
        impact_factor: inputs.impact.factor(),
        adoption_speed: inputs.adoption_speed,
    }
}

fn simulation_view(eval: &Evaluation, seed: u64) -> SimulationView {
    let counts = eval.simulation.scenario_counts;
    SimulationView {
        seed,
        runs: eval.simulation.len(),
        expected_price: eval.expected_price,
        analytic_expected_price: eval.analytic_expected_price,
        scenario_counts: ScenarioCounts {
            bear: counts[0],
            base: counts[1],
            bull: counts[2],
        },
        summary: eval.summary.clone(),
        histogram: eval.histogram.clone(),
    }
}

fn artifact_links(inputs: &DashboardInputs, seed: u64) -> ArtifactLinks {
    let qs = to_query_string(inputs, seed);
    ArtifactLinks {
        distribution_chart: format!("/api/charts/distribution.svg?{}", qs),
        forecast_chart: format!("/api/charts/forecast.svg?{}", qs),
        csv_export: format!("/api/export/csv?{}", qs),
    }
}

/// Everything the page renders, in one round trip.
async fn get_dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let seed = query.seed_or_random();

    // The quote never fails the page, so fetch it alongside the simulation
    let (evaluation, quote) = tokio::join!(
        run_evaluation(&state, inputs.clone(), seed),
        state.quotes.status(),
    );
    let eval = evaluation?;

    tracing::info!(
        "Dashboard evaluated: seed={} expected=${:.2} quote={}",
        seed,
        eval.expected_price,
        if quote.is_available() { "live" } else { "unavailable" }
    );

    Ok(Json(ApiResponse::success(DashboardSnapshot {
        inputs: inputs_view(&inputs, eval.bull_probability),
        simulation: simulation_view(&eval, seed),
        links: artifact_links(&inputs, seed),
        forecast: eval.forecast,
        quote,
        news: sample_headlines(),
    })))
}

async fn get_simulation(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SimulationView>>, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let seed = query.seed_or_random();

    let eval = run_evaluation(&state, inputs, seed).await?;
    Ok(Json(ApiResponse::success(simulation_view(&eval, seed))))
}

async fn get_forecast(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MarketCapForecast>>, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let seed = query.seed_or_random();

    let eval = run_evaluation(&state, inputs, seed).await?;
    Ok(Json(ApiResponse::success(eval.forecast)))
}

async fn get_news() -> Json<ApiResponse<Vec<NewsItem>>> {
    Json(ApiResponse::success(sample_headlines()))
}
