//! Service description at `/`

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub module: String,
    pub version: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    let endpoints = BTreeMap::from([
        ("correct_ocr", "/correction/correct_ocr/<subject_id>/<script_id>"),
        ("test_data", "/correction/test_data/<subject_id>/<script_id>"),
        ("test_django_api", "/correction/test_django_api/<subject_id>/<script_id>"),
        ("health_check", "/correction/health"),
    ]);

    Json(IndexResponse {
        message: "OCR Correction API is running".to_string(),
        module: "ocrfix-cs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

pub fn index_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}
