//! HTTP handlers for the exporter
//!
//! This module defines the routes served to the scraping system.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::AppState;
use crate::metrics::CONTENT_TYPE;

// ============================================================================
// API Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

const LANDING_PAGE: &str = r#"<html>
<head><title>impfwatch</title></head>
<body>
<h1>impfwatch</h1>
<p>Vaccination appointment availability exporter.</p>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

// ============================================================================
// Routes
// ============================================================================

/// Create the exporter router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health_check))
        .route("/metrics", get(scrape_metrics))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Liveness only; does not contact the upstream
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Run one collection cycle and render it
async fn scrape_metrics(State(state): State<AppState>) -> Response {
    let snapshot = state.collector.collect().await;

    match state.metrics.render(&snapshot) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, category = e.category().as_str(), "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {e}"),
            )
                .into_response()
        }
    }
}
