use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use rust_embed::Embed;

use crate::ApiResponse;

#[derive(Embed)]
#[folder = "../../frontend/"]
#[exclude = "*.md"]
pub struct FrontendAssets;

/// Fallback handler: static assets, with `/` mapped to `index.html`.
pub async fn serve_frontend(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    if path.starts_with("api/") {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!("No such endpoint: /{}", path))),
        )
            .into_response();
    }

    let path = if path.is_empty() { "index.html" } else { path };
    match FrontendAssets::get(path) {
        Some(file) => {
            let mime = file.metadata.mimetype().to_string();
            ([(header::CONTENT_TYPE, mime)], file.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
