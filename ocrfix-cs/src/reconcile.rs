//! Read-modify-write reconciliation of stored correction records
//!
//! A script's record on the backend (`compare-text`) carries fields owned
//! by several subsystems. This service owns only
//! `final_corrected_text.result`; `vlmdesc` and `mcq` belong to others and
//! must survive every write. Lifecycle of a record as seen from here:
//! absent, then created once, then updated any number of times. Records
//! are never deleted.
//!
//! Lookup and write are not atomic. Two concurrent corrections of the same
//! script can both see "absent" and both create, or both update the same
//! record; the backend offers no version field to guard against this.

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::backend::client::body_text;
use crate::backend::{BackendClient, ClientError};

pub const COMPARE_TEXT_PATH: &str = "/compare-text/";

/// Placeholder for `restructured.final_text` on create
pub const DEFAULT_FINAL_TEXT: &str = " ";
/// Placeholder for `vlmdesc.vlm_desc` on create
pub const DEFAULT_VLM_DESC: &str = "";

/// Which write was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    /// `PUT /compare-text/{id}/` (partial update)
    Update { id: String },
    /// `POST /compare-text/`
    Create,
}

/// A successful write and the backend's answer
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    pub action: WriteAction,
    pub status: u16,
    pub response: Value,
}

/// Persists corrected text for scripts
#[derive(Debug, Clone)]
pub struct Reconciler {
    client: BackendClient,
}

impl Reconciler {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find the stored record for a script, if any
    ///
    /// The filtered query is tried first. Its exact `script_id` match wins;
    /// failing that, its first element is used as a best-effort "most
    /// recent" record. If the filtered query fails or yields nothing, the
    /// unfiltered collection is scanned for an exact match only. Lookup
    /// failures are not errors: they mean "no existing record".
    pub async fn find_existing(&self, script_id: &str) -> Option<Value> {
        match self
            .client
            .get_with_query(COMPARE_TEXT_PATH, &[("script_id", script_id)])
            .await
        {
            Ok(response) if response.status == 200 => {
                if let Some(record) = select_filtered(&response.body, script_id) {
                    return Some(record.clone());
                }
                debug!(script_id, "Filtered lookup returned nothing usable");
            }
            Ok(response) => {
                warn!(script_id, status = response.status, "Filtered lookup rejected");
            }
            Err(e) => {
                warn!(script_id, error = %e, "Filtered lookup failed");
            }
        }

        match self.client.get(COMPARE_TEXT_PATH).await {
            Ok(response) if response.status == 200 => {
                select_exact(&response.body, script_id).cloned()
            }
            Ok(response) => {
                warn!(script_id, status = response.status, "Unfiltered lookup rejected");
                None
            }
            Err(e) => {
                warn!(script_id, error = %e, "Unfiltered lookup failed");
                None
            }
        }
    }

    /// Write corrected text for a script
    ///
    /// An existing record with an id gets a partial update carrying only
    /// `final_corrected_text`. Otherwise a record is created with
    /// placeholders for the fields owned elsewhere (kept from an id-less
    /// existing record when one was found). Only 200 and 201 count as
    /// success.
    pub async fn persist(
        &self,
        script_id: &str,
        corrected_text: &str,
    ) -> Result<PersistOutcome, ClientError> {
        let existing = self.find_existing(script_id).await;

        let (action, response) = match existing.as_ref().and_then(record_id) {
            Some(id) => {
                let path = format!("{}{}/", COMPARE_TEXT_PATH, id);
                info!(script_id, record_id = %id, "Updating existing correction record");
                let response = self.client.put(&path, &update_payload(corrected_text)).await?;
                (WriteAction::Update { id }, response)
            }
            None => {
                info!(
                    script_id,
                    found_without_id = existing.is_some(),
                    "Creating correction record"
                );
                let payload = create_payload(script_id, corrected_text, existing.as_ref());
                let response = self.client.post(COMPARE_TEXT_PATH, &payload).await?;
                (WriteAction::Create, response)
            }
        };

        if !matches!(response.status, 200 | 201) {
            warn!(script_id, status = response.status, "Saving correction failed");
            return Err(ClientError::RemoteApi {
                status: response.status,
                body: body_text(&response.body),
            });
        }

        info!(script_id, action = ?action, "Saved correction");
        Ok(PersistOutcome {
            action,
            status: response.status,
            response: response.body,
        })
    }
}

/// Payload for a partial update: only the field this service owns
pub fn update_payload(corrected_text: &str) -> Value {
    json!({
        "final_corrected_text": {
            "result": corrected_text,
        }
    })
}

/// Payload for a create
///
/// `restructured.final_text` and `vlmdesc.vlm_desc` are required by the
/// backend; values from `existing` are carried over verbatim, placeholders
/// fill the rest. `mcq` is never sent.
pub fn create_payload(script_id: &str, corrected_text: &str, existing: Option<&Value>) -> Value {
    let final_text = existing
        .and_then(|r| r.pointer("/restructured/final_text"))
        .filter(|v| v.is_string())
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_FINAL_TEXT));
    let vlm_desc = existing
        .and_then(|r| r.pointer("/vlmdesc/vlm_desc"))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_VLM_DESC));

    json!({
        "script_id": script_id,
        "restructured": {
            "final_text": final_text,
        },
        "vlmdesc": {
            "vlm_desc": vlm_desc,
        },
        "final_corrected_text": {
            "result": corrected_text,
        }
    })
}

/// Backend primary key of a record: `compare_text_id`, else `id`
pub fn record_id(record: &Value) -> Option<String> {
    ["compare_text_id", "id"]
        .iter()
        .find_map(|key| match record.get(*key)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
}

/// Whether a record's `script_id` equals `script_id` as text or as number
pub fn script_id_matches(record: &Value, script_id: &str) -> bool {
    let wanted = script_id.trim();
    match record.get("script_id") {
        Some(Value::String(s)) => {
            let s = s.trim();
            s == wanted || matches!((s.parse::<i64>(), wanted.parse::<i64>()), (Ok(a), Ok(b)) if a == b)
        }
        Some(Value::Number(n)) => match (n.as_i64(), wanted.parse::<i64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => matches!((n.as_f64(), wanted.parse::<f64>()), (Some(a), Ok(b)) if a == b),
        },
        _ => false,
    }
}

/// Records carried by a listing: a bare sequence or a paginated mapping
/// with `results`
fn listing(body: &Value) -> Option<&[Value]> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn looks_like_record(map: &Map<String, Value>) -> bool {
    ["script_id", "compare_text_id", "id"]
        .iter()
        .any(|key| map.contains_key(*key))
}

/// Selection over the filtered query: exact match, else first element,
/// else a single record mapping
pub fn select_filtered<'a>(body: &'a Value, script_id: &str) -> Option<&'a Value> {
    if let Some(items) = listing(body) {
        if let Some(found) = items.iter().find(|r| script_id_matches(r, script_id)) {
            return Some(found);
        }
        return items.first().filter(|r| r.is_object());
    }
    match body {
        Value::Object(map) if looks_like_record(map) => Some(body),
        _ => None,
    }
}

/// Selection over the unfiltered collection: exact match only
pub fn select_exact<'a>(body: &'a Value, script_id: &str) -> Option<&'a Value> {
    if let Some(items) = listing(body) {
        return items.iter().find(|r| script_id_matches(r, script_id));
    }
    Some(body).filter(|r| r.is_object() && script_id_matches(r, script_id))
}
