//! Combined OCR / secondary OCR / context fetch
//!
//! `GET {backend}/combined-data/?subject_id=&script_id=` answers with a
//! mapping carrying at least `ocr_json`; `textract_results` and `context`
//! may be missing.

use serde_json::Value;
use tracing::info;

use super::client::BackendClient;
use crate::error::CorrectionError;
use crate::normalize::{is_truthy, json_len, json_type_name};

pub const COMBINED_DATA_PATH: &str = "/combined-data/";

/// Everything needed for one correction, fetched once per request
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    /// First-pass OCR (`ocr_json`)
    pub primary_ocr: Value,
    /// Secondary OCR (`textract_results`); `Null` when absent
    pub secondary_ocr: Value,
    /// Free-form context; `Null` when absent
    pub context: Value,
}

impl CombinedRecord {
    /// Record with every member `Null`
    pub fn empty() -> Self {
        Self {
            primary_ocr: Value::Null,
            secondary_ocr: Value::Null,
            context: Value::Null,
        }
    }
}

/// Fetch and validate the combined record for a script
pub async fn fetch_combined(
    client: &BackendClient,
    subject_id: &str,
    script_id: &str,
) -> Result<CombinedRecord, CorrectionError> {
    info!(subject_id, script_id, "Requesting combined data");

    let body = client
        .get_with_query(
            COMBINED_DATA_PATH,
            &[("subject_id", subject_id), ("script_id", script_id)],
        )
        .await?
        .into_success()?;

    parse_combined(body, subject_id, script_id)
}

/// Validate a `combined-data` body
///
/// Fails when `ocr_json` is missing from the mapping or is falsy (null,
/// empty string, empty list, empty mapping).
pub fn parse_combined(
    body: Value,
    subject_id: &str,
    script_id: &str,
) -> Result<CombinedRecord, CorrectionError> {
    let mut data = match body {
        Value::Object(data) => data,
        other => {
            return Err(CorrectionError::DataAbsent(format!(
                "No valid data found in response. Available keys: [] (got {})",
                json_type_name(&other)
            )))
        }
    };

    let keys: Vec<&str> = data.keys().map(String::as_str).collect();
    info!(keys = ?keys, "Combined data response keys");

    let Some(primary_ocr) = data.remove("ocr_json") else {
        return Err(CorrectionError::DataAbsent(format!(
            "No valid data found in response. Available keys: {:?}",
            data.keys().collect::<Vec<_>>()
        )));
    };
    let secondary_ocr = data.remove("textract_results").unwrap_or(Value::Null);
    let context = data.remove("context").unwrap_or(Value::Null);

    info!(
        ocr_type = json_type_name(&primary_ocr),
        ocr_len = json_len(&primary_ocr),
        textract_type = json_type_name(&secondary_ocr),
        textract_len = json_len(&secondary_ocr),
        "Combined data received"
    );

    if !is_truthy(&primary_ocr) {
        return Err(CorrectionError::DataAbsent(format!(
            "No OCR data found for subject_id: {}, script_id: {}",
            subject_id, script_id
        )));
    }

    Ok(CombinedRecord {
        primary_ocr,
        secondary_ocr,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_record() {
        let record = parse_combined(
            json!({
                "ocr_json": [{"BlockType": "LINE", "Text": "Hello"}],
                "textract_results": {"pages": []},
                "context": "Biology, Q1",
                "structured_json": {}
            }),
            "3",
            "42",
        )
        .unwrap();

        assert_eq!(record.primary_ocr, json!([{"BlockType": "LINE", "Text": "Hello"}]));
        assert_eq!(record.secondary_ocr, json!({"pages": []}));
        assert_eq!(record.context, json!("Biology, Q1"));
    }

    #[test]
    fn test_missing_optional_members_default_to_null() {
        let record = parse_combined(json!({"ocr_json": "text"}), "3", "42").unwrap();
        assert_eq!(record.secondary_ocr, Value::Null);
        assert_eq!(record.context, Value::Null);
    }

    #[test]
    fn test_missing_ocr_key_lists_available_keys() {
        let err = parse_combined(json!({"context": "x", "textract_results": []}), "3", "42")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("No valid data found in response"));
        assert!(message.contains("context"));
        assert!(message.contains("textract_results"));
    }

    #[test]
    fn test_empty_ocr_is_absent() {
        for empty in [Value::Null, json!(""), json!([]), json!({})] {
            let err = parse_combined(json!({"ocr_json": empty}), "3", "42").unwrap_err();
            assert!(matches!(err, CorrectionError::DataAbsent(_)));
            assert_eq!(
                err.to_string(),
                "No OCR data found for subject_id: 3, script_id: 42"
            );
        }
    }

    #[test]
    fn test_non_mapping_body_is_rejected() {
        let err = parse_combined(json!(["not", "a", "mapping"]), "3", "42").unwrap_err();
        assert!(matches!(err, CorrectionError::DataAbsent(_)));
    }
}
