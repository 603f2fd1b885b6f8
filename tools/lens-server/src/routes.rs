//! HTTP routes.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::upstream::LensUpstream;

pub const MISSING_IMAGE_URL: &str = "Missing imageUrl in request body";
pub const UPSTREAM_FAILURE: &str = "Failed to fetch results from the image search provider";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn LensUpstream>,
}

#[derive(Debug, Deserialize)]
struct LensRequest {
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/google-lens", post(google_lens))
        .route("/api/health", get(health))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn google_lens(State(state): State<AppState>, body: Bytes) -> Response {
    let request: LensRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid JSON body: {}", e) }),
            )
        }
    };

    let image_url = match request.image_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, json!({ "error": MISSING_IMAGE_URL })),
    };

    tracing::info!(image_len = image_url.len(), inline = image_url.starts_with("data:"), "visual match request");

    match state.upstream.lens(image_url).await {
        Ok(payload) => {
            tracing::debug!(matches = payload.match_count(), "visual match response");
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "visual match upstream failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string(), "message": UPSTREAM_FAILURE }),
            )
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "API server is running" }))
}

fn error_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
