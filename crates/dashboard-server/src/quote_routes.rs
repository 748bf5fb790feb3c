use axum::{extract::State, routing::get, Json, Router};

use crate::quote_service::QuoteStatus;
use crate::{ApiResponse, AppState};

pub fn quote_routes() -> Router<AppState> {
    Router::new().route("/api/quote", get(get_quote))
}

/// Live close for the configured ticker. Provider failures still return 200
/// with an `unavailable` status so the page can show a warning.
async fn get_quote(State(state): State<AppState>) -> Json<ApiResponse<QuoteStatus>> {
    Json(ApiResponse::success(state.quotes.status().await))
}
