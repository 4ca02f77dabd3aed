//! Diagnostic endpoints
//!
//! Both routes always answer HTTP 200; problems are reported in the body.
//! Nothing is written to the backend.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::backend::client::body_text;
use crate::backend::{parse_combined, CombinedRecord, COMBINED_DATA_PATH};
use crate::normalize::{
    compute_statistics, extract_primary_text, extract_secondary_text, is_truthy, json_len,
    json_type_name, preview, ExtractionStats,
};
use crate::AppState;

const JSON_PREVIEW_CHARS: usize = 300;
const TEXT_PREVIEW_CHARS: usize = 200;
const EMPTY_PREVIEW: &str = "None/Empty";

/// Body of `GET /correction/test_data/{subject_id}/{script_id}`
#[derive(Debug, Serialize)]
pub struct TestDataResponse {
    pub subject_id: String,
    pub script_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_api_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_api_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_results: Option<ParsedResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_api_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the correction flow would see for a combined-data answer
#[derive(Debug, Serialize)]
pub struct ParsedResults {
    pub ocr_json_blocks_count: usize,
    pub ocr_json_type: &'static str,
    pub ocr_json_preview: String,
    pub textract_json_blocks_count: usize,
    pub textract_json_type: &'static str,
    pub textract_json_preview: String,
    pub context_data: Option<String>,
    pub parsing_error: Option<String>,
    pub ocr_text_preview: Option<String>,
    pub textract_text_preview: Option<String>,
    pub textract_text_full_length: usize,
    pub textract_statistics: ExtractionStats,
    pub sample_ocr_block: Option<Value>,
    pub sample_textract_structure: TextractStructure,
}

#[derive(Debug, Serialize)]
pub struct TextractStructure {
    pub has_textract_results: bool,
    pub textract_keys: Option<Vec<String>>,
}

/// Body of `GET /correction/test_django_api/{subject_id}/{script_id}`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PassthroughResponse {
    Answered {
        url_called: String,
        status_code: u16,
        response_headers: BTreeMap<String, String>,
        response_body: Value,
        subject_id: String,
        script_id: String,
    },
    Failed {
        error: String,
        url_attempted: String,
        subject_id: String,
        script_id: String,
    },
}

/// GET /correction/test_data/{subject_id}/{script_id}
pub async fn test_data(
    State(state): State<AppState>,
    Path((subject_id, script_id)): Path<(String, String)>,
) -> Json<TestDataResponse> {
    info!(%subject_id, %script_id, "Testing data retrieval");

    let query = [("subject_id", subject_id.as_str()), ("script_id", script_id.as_str())];
    let mut response = TestDataResponse {
        subject_id: subject_id.clone(),
        script_id: script_id.clone(),
        backend_api_status: None,
        raw_api_response: None,
        parsed_results: None,
        backend_api_error: None,
        error: None,
    };

    let raw = match state.backend.fetch_raw(COMBINED_DATA_PATH, &query).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(%subject_id, %script_id, error = %e, "Data retrieval test failed");
            response.error = Some(format!("Exception occurred: {}", e));
            return Json(response);
        }
    };

    response.backend_api_status = Some(raw.status);
    if raw.status != 200 {
        response.backend_api_error = Some(body_text(&raw.body));
        response.error = Some(format!("Backend API returned status {}", raw.status));
        return Json(response);
    }

    let parsed = parse_combined(raw.body.clone(), &subject_id, &script_id);
    response.parsed_results = Some(match parsed {
        Ok(record) => parsed_results(&record, None),
        Err(e) => parsed_results(&CombinedRecord::empty(), Some(e.to_string())),
    });
    response.raw_api_response = Some(raw.body);

    Json(response)
}

fn parsed_results(record: &CombinedRecord, parsing_error: Option<String>) -> ParsedResults {
    let ocr = &record.primary_ocr;
    let textract = &record.secondary_ocr;

    let textract_text = is_truthy(textract).then(|| extract_secondary_text(textract));
    let textract_keys = textract
        .as_object()
        .map(|map| map.keys().cloned().collect::<Vec<_>>());

    ParsedResults {
        ocr_json_blocks_count: json_len(ocr),
        ocr_json_type: json_type_name(ocr),
        ocr_json_preview: json_preview(ocr),
        textract_json_blocks_count: json_len(textract),
        textract_json_type: json_type_name(textract),
        textract_json_preview: json_preview(textract),
        context_data: is_truthy(&record.context)
            .then(|| preview(&body_text(&record.context), TEXT_PREVIEW_CHARS)),
        parsing_error,
        ocr_text_preview: is_truthy(ocr)
            .then(|| preview(&extract_primary_text(ocr), TEXT_PREVIEW_CHARS)),
        textract_text_preview: textract_text
            .as_deref()
            .map(|text| preview(text, TEXT_PREVIEW_CHARS)),
        textract_text_full_length: textract_text.map(|text| text.chars().count()).unwrap_or(0),
        textract_statistics: compute_statistics(textract),
        sample_ocr_block: ocr.as_array().and_then(|blocks| blocks.first()).cloned(),
        sample_textract_structure: TextractStructure {
            has_textract_results: textract
                .as_object()
                .map(|map| map.contains_key("textract_results"))
                .unwrap_or(false),
            textract_keys,
        },
    }
}

fn json_preview(value: &Value) -> String {
    if is_truthy(value) {
        preview(&body_text(value), JSON_PREVIEW_CHARS)
    } else {
        EMPTY_PREVIEW.to_string()
    }
}

/// GET /correction/test_django_api/{subject_id}/{script_id}
pub async fn test_backend_api(
    State(state): State<AppState>,
    Path((subject_id, script_id)): Path<(String, String)>,
) -> Json<PassthroughResponse> {
    let query = [("subject_id", subject_id.as_str()), ("script_id", script_id.as_str())];

    match state.backend.fetch_raw(COMBINED_DATA_PATH, &query).await {
        Ok(raw) => Json(PassthroughResponse::Answered {
            url_called: raw.url,
            status_code: raw.status,
            response_headers: raw.headers,
            response_body: raw.body,
            subject_id,
            script_id,
        }),
        Err(e) => Json(PassthroughResponse::Failed {
            error: e.to_string(),
            url_attempted: state.backend.url_with_query(COMBINED_DATA_PATH, &query),
            subject_id,
            script_id,
        }),
    }
}

pub fn diagnostic_routes() -> Router<AppState> {
    Router::new()
        .route("/test_data/:subject_id/:script_id", get(test_data))
        .route("/test_django_api/:subject_id/:script_id", get(test_backend_api))
}
