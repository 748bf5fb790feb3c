//! SVG chart endpoints used as `<img>` sources by the dashboard page.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use report_export::{distribution_chart_svg, forecast_chart_svg};

use crate::params::DashboardQuery;
use crate::{run_evaluation, AppError, AppState};

const SVG_MIME: &str = "image/svg+xml";

pub fn chart_routes() -> Router<AppState> {
    Router::new()
        .route("/api/charts/distribution.svg", get(get_distribution_chart))
        .route("/api/charts/forecast.svg", get(get_forecast_chart))
}

fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, SVG_MIME)], svg).into_response()
}

async fn get_distribution_chart(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let eval = run_evaluation(&state, inputs, query.seed_or_random()).await?;

    let svg = distribution_chart_svg(&eval.summary, &eval.histogram)?;
    Ok(svg_response(svg))
}

async fn get_forecast_chart(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let eval = run_evaluation(&state, inputs, query.seed_or_random()).await?;

    let svg = forecast_chart_svg(&eval.forecast)?;
    Ok(svg_response(svg))
}
