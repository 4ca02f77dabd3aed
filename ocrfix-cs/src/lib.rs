//! ocrfix-cs library - OCR correction service
//!
//! Fetches OCR and secondary OCR for a script from the records backend,
//! flattens both into text, runs the external correction pipeline and
//! writes the corrected text back without disturbing fields owned by
//! other subsystems.

pub mod api;
pub mod backend;
pub mod correction;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;

pub use crate::error::{ApiError, ApiResult, CorrectionError};

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use ocrfix_common::config::{ServerConfig, TomlConfig};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::backend::BackendClient;
use crate::pipeline::{CorrectionPipeline, HttpCorrectionPipeline};

/// Application state shared across HTTP handlers
///
/// Everything here is read-only after startup; requests share no mutable
/// state.
#[derive(Clone)]
pub struct AppState {
    /// Records backend client
    pub backend: BackendClient,
    /// External correction pipeline
    pub pipeline: Arc<dyn CorrectionPipeline>,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(backend: BackendClient, pipeline: Arc<dyn CorrectionPipeline>) -> Self {
        Self {
            backend,
            pipeline,
            allowed_origins: ServerConfig::default().allowed_origins,
            startup_time: Utc::now(),
        }
    }

    /// Build state from resolved configuration, using the HTTP pipeline
    pub fn from_config(config: &TomlConfig) -> anyhow::Result<Self> {
        let backend = BackendClient::new(&config.backend)?;
        let pipeline = HttpCorrectionPipeline::new(&config.pipeline)?;
        Ok(Self::new(backend, Arc::new(pipeline))
            .with_allowed_origins(config.server.allowed_origins.clone()))
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}

/// Build application router
///
/// `/` describes the service; everything else lives under `/correction`.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    let correction = Router::new()
        .merge(api::correction_routes())
        .merge(api::diagnostic_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(api::index_routes())
        .nest("/correction", correction)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::OPTIONS]);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
}
