//! Proxy Forwarder
//!
//! A same-origin relay so the client never needs the backend's real
//! network location. Both routes are stateless pass-throughs: the
//! backend's status and body come back verbatim, with no validation or
//! error translation. The one exception is a transport failure toward
//! the backend, where there is no backend response to relay and the
//! proxy answers 502 itself.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Proxy state: where the backend lives and the client to reach it.
pub struct ProxyState {
    pub backend_api: String,
    pub http: reqwest::Client,
}

impl ProxyState {
    pub fn new(backend_api: String) -> Self {
        Self {
            backend_api,
            http: reqwest::Client::new(),
        }
    }
}

/// Create the proxy router.
pub fn create_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/query/:id", post(query))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Forward an experiment payload, unmodified, to the backend's generate
/// endpoint.
async fn generate(State(state): State<Arc<ProxyState>>, body: Bytes) -> Response {
    let url = format!("{}/image/generate", state.backend_api);
    forward(&state, &url, body).await
}

/// Forward a result query for the job identified by the path parameter.
async fn query(State(state): State<Arc<ProxyState>>, Path(id): Path<String>) -> Response {
    let url = format!("{}/image/query", state.backend_api);
    let body = serde_json::to_vec(&json!({ "requestId": id })).unwrap_or_default();
    forward(&state, &url, Bytes::from(body)).await
}

async fn forward(state: &ProxyState, url: &str, body: Bytes) -> Response {
    let result = state
        .http
        .post(url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await;

    let response = match result {
        Ok(r) => r,
        Err(e) => {
            warn!(url, "backend unreachable: {e}");
            return (StatusCode::BAD_GATEWAY, format!("backend unreachable: {e}"))
                .into_response();
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let bytes = response.bytes().await.unwrap_or_default();

    (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
}
