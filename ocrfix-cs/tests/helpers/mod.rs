//! Test helper utilities
//!
//! A records backend stand-in served by axum on an ephemeral port, and a
//! correction pipeline that records its inputs.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    Router,
};
use ocrfix_common::config::BackendConfig;
use ocrfix_cs::backend::BackendClient;
use ocrfix_cs::pipeline::{CorrectionInput, CorrectionPipeline, PipelineError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// One request as seen by the mock backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
}

/// Canned answers, keyed by endpoint
#[derive(Debug, Clone)]
pub struct MockResponses {
    pub root: (u16, Value),
    pub combined: (u16, Value),
    /// `GET /compare-text/?script_id=...`
    pub filtered: (u16, Value),
    /// `GET /compare-text/`
    pub unfiltered: (u16, Value),
    /// `PUT /compare-text/{id}/`
    pub update: (u16, Value),
    /// `POST /compare-text/`
    pub create: (u16, Value),
}

impl Default for MockResponses {
    fn default() -> Self {
        Self {
            root: (200, json!({"api": "records"})),
            combined: (200, json!({})),
            filtered: (200, json!([])),
            unfiltered: (200, json!([])),
            update: (200, json!({"updated": true})),
            create: (201, json!({"created": true})),
        }
    }
}

impl MockResponses {
    pub fn with_combined(mut self, body: Value) -> Self {
        self.combined = (200, body);
        self
    }

    pub fn with_filtered(mut self, body: Value) -> Self {
        self.filtered = (200, body);
        self
    }

    pub fn with_unfiltered(mut self, body: Value) -> Self {
        self.unfiltered = (200, body);
        self
    }
}

struct MockState {
    responses: MockResponses,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Running mock backend
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(responses: MockResponses) -> Self {
        let state = Arc::new(MockState {
            responses,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(handle)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind mock backend");
        let addr = listener.local_addr().expect("Should have local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> BackendClient {
        backend_client(&self.base_url)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Recorded writes (PUT/POST)
    pub fn writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::PUT || r.method == Method::POST)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let query = uri.query().map(str::to_string);
    let body_json = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        body: body_json,
    });

    let responses = &state.responses;
    let (status, body) = match (method.as_str(), path.as_str()) {
        ("GET", "/") => responses.root.clone(),
        ("GET", "/combined-data/") => responses.combined.clone(),
        ("GET", "/compare-text/") if query.is_some() => responses.filtered.clone(),
        ("GET", "/compare-text/") => responses.unfiltered.clone(),
        ("POST", "/compare-text/") => responses.create.clone(),
        ("PUT", p) if p.starts_with("/compare-text/") => responses.update.clone(),
        _ => (404, json!({"detail": "Not found."})),
    };

    let text = match body {
        Value::String(s) => s,
        other => other.to_string(),
    };
    (StatusCode::from_u16(status).unwrap(), text)
}

struct PipelineEndpointState {
    status: u16,
    body: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Stand-in for the remote correction pipeline: answers every request
/// with a fixed status and body and records what it received
pub struct MockPipelineEndpoint {
    pub url: String,
    state: Arc<PipelineEndpointState>,
}

impl MockPipelineEndpoint {
    pub async fn start(status: u16, body: &str) -> Self {
        let state = Arc::new(PipelineEndpointState {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(handle_pipeline)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind mock pipeline");
        let addr = listener.local_addr().expect("Should have local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock pipeline failed");
        });

        Self {
            url: format!("http://{}/kickoff", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle_pipeline(
    State(state): State<Arc<PipelineEndpointState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::String(body)),
    });
    (StatusCode::from_u16(state.status).unwrap(), state.body.clone())
}

pub fn backend_client(base_url: &str) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .unwrap()
}

/// Base URL on which nothing is listening
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Pipeline double: returns a fixed reply and records every input
pub struct MockPipeline {
    reply: Result<String, String>,
    calls: Mutex<Vec<CorrectionInput>>,
}

impl MockPipeline {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CorrectionInput> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorrectionPipeline for MockPipeline {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn invoke(&self, input: &CorrectionInput) -> Result<String, PipelineError> {
        self.calls.lock().unwrap().push(input.clone());
        self.reply
            .clone()
            .map_err(PipelineError::Transport)
    }
}

/// Combined-data body with one LINE block and one page of secondary OCR
pub fn sample_combined() -> Value {
    json!({
        "ocr_json": [
            {"BlockType": "LINE", "Text": "Photosynthesis converts"},
            {"BlockType": "WORD", "Text": "ignored"},
            {"text": "light energy"}
        ],
        "textract_results": [
            {
                "page_number": 1,
                "extracted_text": {
                    "total_lines": 2,
                    "extracted_lines": [
                        {"text": "Photosynthesis converts", "confidence": 98.0},
                        {"text": "light energy", "confidence": 94.0}
                    ]
                }
            }
        ],
        "context": "Biology paper 1, question 3"
    })
}
