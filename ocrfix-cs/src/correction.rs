//! One correction run: fetch, normalize, correct, persist
//!
//! Steps run strictly in sequence. Any failure ends the run; nothing is
//! rolled back, so a pipeline result whose save fails is lost and the whole
//! request must be retried.

use serde_json::Value;
use tracing::{debug, error, info};

use crate::backend::{fetch_combined, BackendClient, CombinedRecord};
use crate::error::CorrectionError;
use crate::normalize::{
    compute_statistics, extract_primary_text, extract_secondary_text, is_truthy, preview,
};
use crate::pipeline::{CorrectionInput, CorrectionPipeline};
use crate::reconcile::{PersistOutcome, Reconciler};

/// Flattened result of a run, as reported to the front door
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub success: bool,
    pub message: String,
}

impl CorrectionOutcome {
    fn success(script_id: &str) -> Self {
        Self {
            success: true,
            message: format!("Success: OCR corrected and saved for script_id {}.", script_id),
        }
    }

    fn failure(error: CorrectionError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
        }
    }
}

/// Run the full correction chain for one script
///
/// Never fails: every error is logged and flattened into an unsuccessful
/// outcome carrying a user-visible message.
pub async fn run_correction(
    backend: &BackendClient,
    pipeline: &dyn CorrectionPipeline,
    subject_id: &str,
    script_id: &str,
) -> CorrectionOutcome {
    match correct_and_persist(backend, pipeline, subject_id, script_id).await {
        Ok(outcome) => {
            info!(
                subject_id,
                script_id,
                action = ?outcome.action,
                "OCR correction completed"
            );
            CorrectionOutcome::success(script_id)
        }
        Err(e) => {
            error!(subject_id, script_id, error = %e, "OCR correction failed");
            CorrectionOutcome::failure(e)
        }
    }
}

async fn correct_and_persist(
    backend: &BackendClient,
    pipeline: &dyn CorrectionPipeline,
    subject_id: &str,
    script_id: &str,
) -> Result<PersistOutcome, CorrectionError> {
    let record = fetch_combined(backend, subject_id, script_id).await?;
    let input = prepare_input(&record, subject_id, script_id)?;

    info!(pipeline = pipeline.name(), script_id, "Running correction pipeline");
    let corrected = pipeline.invoke(&input).await?;
    debug!(script_id, result_len = corrected.len(), "Pipeline returned");

    Reconciler::new(backend.clone())
        .persist(script_id, &corrected)
        .await
        .map_err(CorrectionError::Persist)
}

/// Normalize a combined record into pipeline input
///
/// Fails when primary OCR flattens to nothing; secondary text may be empty.
pub fn prepare_input(
    record: &CombinedRecord,
    subject_id: &str,
    script_id: &str,
) -> Result<CorrectionInput, CorrectionError> {
    let primary_text = extract_primary_text(&record.primary_ocr);
    if primary_text.is_empty() {
        return Err(CorrectionError::DataAbsent(format!(
            "No OCR text could be extracted for script_id: {}",
            script_id
        )));
    }

    let secondary_text = extract_secondary_text(&record.secondary_ocr);
    let stats = compute_statistics(&record.secondary_ocr);
    let context = context_text(&record.context, subject_id, script_id);

    info!(
        ocr_len = primary_text.len(),
        textract_len = secondary_text.len(),
        textract_pages = stats.total_pages,
        textract_lines = stats.total_lines,
        textract_blocks = stats.total_blocks,
        average_confidence = ?stats.average_confidence,
        "Normalized OCR inputs"
    );
    debug!(
        ocr_preview = %preview(&primary_text, 200),
        textract_preview = %preview(&secondary_text, 200),
        context_preview = %preview(&context, 100),
        "Pipeline input previews"
    );

    Ok(CorrectionInput {
        primary_text,
        secondary_text,
        context,
    })
}

/// Context handed to the pipeline
///
/// Strings are used as-is and other JSON is serialized; a falsy value
/// falls back to an identifier line.
pub fn context_text(context: &Value, subject_id: &str, script_id: &str) -> String {
    if !is_truthy(context) {
        return format!("Subject ID: {}, Script ID: {}", subject_id, script_id);
    }
    match context {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(primary: Value, secondary: Value, context: Value) -> CombinedRecord {
        CombinedRecord {
            primary_ocr: primary,
            secondary_ocr: secondary,
            context,
        }
    }

    #[test]
    fn test_prepare_input_normalizes_both_sources() {
        let input = prepare_input(
            &record(
                json!([{"BlockType": "LINE", "Text": "Helo"}, {"text": "wrld"}]),
                json!([{"extracted_text": {"extracted_lines": [{"text": "Hello"}, {"text": "world"}]}}]),
                json!("Biology"),
            ),
            "3",
            "42",
        )
        .unwrap();

        assert_eq!(input.primary_text, "Helo wrld");
        assert_eq!(input.secondary_text, "Hello world");
        assert_eq!(input.context, "Biology");
    }

    #[test]
    fn test_unextractable_primary_is_rejected() {
        let err = prepare_input(
            &record(json!([{"BlockType": "WORD", "Text": "x"}]), Value::Null, Value::Null),
            "3",
            "42",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No OCR text could be extracted for script_id: 42"
        );
    }

    #[test]
    fn test_secondary_may_be_empty() {
        let input = prepare_input(&record(json!("text"), Value::Null, Value::Null), "3", "42")
            .unwrap();
        assert_eq!(input.secondary_text, "");
    }

    #[test]
    fn test_context_fallback() {
        assert_eq!(
            context_text(&Value::Null, "3", "42"),
            "Subject ID: 3, Script ID: 42"
        );
        assert_eq!(
            context_text(&json!(""), "3", "42"),
            "Subject ID: 3, Script ID: 42"
        );
        assert_eq!(context_text(&json!({"topic": "cells"}), "3", "42"), r#"{"topic":"cells"}"#);
    }
}
