use axum::{
    extract::{rejection::QueryRejection, Extension, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use report_export::{simulation_csv, CSV_FILE_NAME, CSV_MIME};

use crate::params::DashboardQuery;
use crate::request_id::RequestId;
use crate::{run_evaluation, AppError, AppState};

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/api/export/csv", get(export_csv))
}

/// Download the sampled prices as `ipo_simulation.csv`.
///
/// Pass the `seed` reported by `/api/dashboard` to export the same sample
/// the page is showing.
async fn export_csv(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = DashboardQuery::from_extractor(query)?;
    let inputs = query.inputs()?;
    let seed = query.seed_or_random();

    let eval = run_evaluation(&state, inputs, seed).await?;
    let bytes = simulation_csv(&eval.simulation.prices)?;

    tracing::info!(
        request_id = %request_id.0,
        "CSV export: {} rows, {} bytes, seed={}",
        eval.simulation.len(),
        bytes.len(),
        seed
    );

    Ok((
        [
            (header::CONTENT_TYPE, CSV_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
