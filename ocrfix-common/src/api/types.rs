//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Outcome label carried in every correction response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionStatus {
    Success,
    Error,
}

impl CorrectionStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            CorrectionStatus::Success
        } else {
            CorrectionStatus::Error
        }
    }
}

/// Body of `GET /correction/correct_ocr/{subject_id}/{script_id}`
///
/// # Examples
///
/// ```
/// use ocrfix_common::api::types::{CorrectionResponse, CorrectionStatus};
///
/// let body = CorrectionResponse {
///     status: CorrectionStatus::Success,
///     subject_id: "3".to_string(),
///     script_id: "42".to_string(),
///     message: "Success: OCR corrected and saved for script_id 42.".to_string(),
/// };
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["status"], "success");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResponse {
    pub status: CorrectionStatus,
    pub subject_id: String,
    pub script_id: String,
    pub message: String,
}

/// Error body returned for rejected requests (400/404/500 outside the
/// correction flow itself)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: CorrectionStatus,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: CorrectionStatus::Error,
            message: message.into(),
        }
    }
}
