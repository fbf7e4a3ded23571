//! Picker UI: embedded static assets served by the gateway.
//!
//! Uses `rust-embed` to bake the `ui/` directory into the binary.
//! In debug mode (`debug-embed` feature), files are read from disk
//! so you can edit JS/CSS and just refresh the browser.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;
use tracing::debug;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` that serves the embedded picker page.
///
/// Merge this **after** the API routes so they take priority over the
/// asset catch-all.
pub fn ui_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/{*path}", get(asset_handler))
}

/// Names of all embedded assets.
pub fn asset_names() -> Vec<String> {
    UiAssets::iter().map(|name| name.into_owned()).collect()
}

async fn index_handler() -> Response {
    serve_asset("index.html")
}

async fn asset_handler(Path(path): Path<String>) -> Response {
    serve_asset(&path)
}

fn serve_asset(path: &str) -> Response {
    let Some(asset) = UiAssets::get(path) else {
        debug!(path, "UI asset not found");
        return (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response();
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref()),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        asset.data.into_owned(),
    )
        .into_response()
}
