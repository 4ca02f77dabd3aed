//! Health check endpoint
//!
//! Reports backend reachability (`GET {backend}/` with a short timeout)
//! along with module name, version and uptime. Always answers 200.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::backend::BackendHealth;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// "connected", "error" or "disconnected"
    pub backend_api: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub module: String,
    pub version: String,
    pub uptime_seconds: i64,
}

/// GET /correction/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut response = HealthResponse {
        status: "unhealthy".to_string(),
        backend_api: String::new(),
        backend_url: None,
        details: None,
        error: None,
        module: "ocrfix-cs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    };

    match state.backend.check_health().await {
        BackendHealth::Connected => {
            response.status = "healthy".to_string();
            response.backend_api = "connected".to_string();
            response.backend_url = Some(state.backend.base_url().to_string());
        }
        BackendHealth::Error { status } => {
            response.backend_api = "error".to_string();
            response.details = Some(format!("Status: {}", status));
        }
        BackendHealth::Disconnected { reason } => {
            response.backend_api = "disconnected".to_string();
            response.error = Some(reason);
        }
    }

    Json(response)
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
