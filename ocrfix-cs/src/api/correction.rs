//! Correction endpoint
//!
//! `GET /correction/correct_ocr/{subject_id}/{script_id}` runs one
//! correction synchronously: 200 on success, 500 on failure, 400 when an
//! id is missing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ocrfix_common::api::{CorrectionResponse, CorrectionStatus};
use tracing::info;

use crate::correction::run_correction;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const IDS_REQUIRED: &str = "Subject ID and Script ID are required";

/// GET /correction/correct_ocr/{subject_id}/{script_id}
pub async fn correct_ocr(
    State(state): State<AppState>,
    Path((subject_id, script_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<CorrectionResponse>)> {
    let (subject_id, script_id) = (subject_id.trim(), script_id.trim());
    if subject_id.is_empty() || script_id.is_empty() {
        return Err(ApiError::BadRequest(IDS_REQUIRED.to_string()));
    }

    info!(subject_id, script_id, "Processing OCR correction");
    let outcome = run_correction(&state.backend, state.pipeline.as_ref(), subject_id, script_id).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(CorrectionResponse {
            status: CorrectionStatus::from_success(outcome.success),
            subject_id: subject_id.to_string(),
            script_id: script_id.to_string(),
            message: outcome.message,
        }),
    ))
}

/// GET /correction/correct_ocr/{subject_id} (script id missing)
pub async fn correct_ocr_missing_script(Path(_subject_id): Path<String>) -> ApiError {
    ApiError::BadRequest(IDS_REQUIRED.to_string())
}

pub fn correction_routes() -> Router<AppState> {
    Router::new()
        .route("/correct_ocr/:subject_id/:script_id", get(correct_ocr))
        .route("/correct_ocr/:subject_id", get(correct_ocr_missing_script))
}
