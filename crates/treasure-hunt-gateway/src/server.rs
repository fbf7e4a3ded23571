//! Axum-based HTTP server.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use treasure_hunt_core::types::{AnalyzeRequest, PipelineResult};

use crate::state::GatewayState;

/// Build the gateway router.
///
/// When `ui_enabled` is true, the embedded picker page is served at `/`.
pub fn build_router(state: Arc<GatewayState>, ui_enabled: bool) -> Router {
    // API routes are registered first so they take priority over the UI catch-all
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/images", get(list_images_handler))
        .route("/api/images/{*name}", get(image_handler))
        .route("/api/profile", get(profile_handler));

    #[cfg(feature = "metrics")]
    let app = app.route("/metrics", get(metrics_handler));

    let mut app = app.with_state(state);
    if ui_enabled {
        app = app.merge(treasure_hunt_web::ui_router());
    }

    app.layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and run until ctrl-c.
pub async fn start_gateway(
    state: Arc<GatewayState>,
    port: u16,
    ui_enabled: bool,
) -> anyhow::Result<()> {
    let bind_addr = state.config.gateway_bind();
    let app = build_router(state, ui_enabled);

    if ui_enabled {
        info!("Treasure hunt UI available at http://{bind_addr}:{port}/");
    }

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "analyses": state.analyses_total.load(Ordering::Relaxed),
        "failed": state.analyses_failed.load(Ordering::Relaxed),
    }))
}

/// Every outcome of a well-formed request is a 200 with the pipeline JSON.
async fn analyze_handler(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(%rejection, "Rejected analyze request");
            let body = PipelineResult::Failure {
                error: format!("Invalid request: {}", rejection.body_text()),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let started = Instant::now();
    let result = state.pipeline.analyze(&request.selected_image_name).await;
    let succeeded = result.is_success();
    state.record_analysis(succeeded);

    #[cfg(feature = "metrics")]
    crate::metrics::record_analyze(succeeded, started.elapsed().as_secs_f64());

    info!(
        image = %request.selected_image_name,
        succeeded,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Analyze request finished"
    );

    Json(result).into_response()
}

async fn list_images_handler(State(state): State<Arc<GatewayState>>) -> Response {
    #[cfg(feature = "metrics")]
    crate::metrics::record_image_request("list");

    match state.store().list_objects().await {
        Ok(images) => Json(json!({ "images": images })).into_response(),
        Err(e) => {
            warn!(error = %e, "Listing images failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

async fn image_handler(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
) -> Response {
    #[cfg(feature = "metrics")]
    crate::metrics::record_image_request("get");

    match state.store().get_object(&name).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&name).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!(image = %name, error = %e, "Image not served");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": e.render() })),
            )
                .into_response()
        }
    }
}

async fn profile_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(json!({ "hunter_name": state.hunter_name() }))
}

#[cfg(feature = "metrics")]
async fn metrics_handler(State(state): State<Arc<GatewayState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
