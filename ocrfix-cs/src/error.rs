//! Error types for ocrfix-cs
//!
//! `CorrectionError` covers one correction run end to end. `ApiError` is
//! what HTTP handlers return for requests rejected before a run starts.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ocrfix_common::api::ErrorResponse;
use thiserror::Error;

use crate::backend::ClientError;
use crate::pipeline::PipelineError;

/// Failure of a correction run
///
/// `Display` output is the user-visible message carried back to the
/// front door.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// Fetching the combined record failed (transport or non-2xx)
    #[error("{0}")]
    Client(#[from] ClientError),

    /// A required field was missing or empty in the fetched payload
    #[error("{0}")]
    DataAbsent(String),

    /// The external correction pipeline failed
    #[error("Error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Writing the corrected text back failed
    #[error("OCR correction completed but failed to save: {0}")]
    Persist(ClientError),
}

/// API error type
///
/// Correction failures are not API errors: they are reported through the
/// correction response body with status 500.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ApiError::BadRequest("missing id".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_correction_error_messages() {
        let err = CorrectionError::Persist(ClientError::RemoteApi {
            status: 500,
            body: "locked".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "OCR correction completed but failed to save: API error: 500 - locked"
        );

        let err = CorrectionError::from(PipelineError::Transport("refused".to_string()));
        assert_eq!(err.to_string(), "Error: Pipeline request failed: refused");
    }
}
