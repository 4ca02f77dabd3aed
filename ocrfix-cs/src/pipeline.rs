//! External correction pipeline
//!
//! The multi-agent correction pipeline is a remote collaborator. This
//! module only packages its input and coerces whatever it answers into a
//! plain string; how the agents are composed is not our concern.

use async_trait::async_trait;
use ocrfix_common::config::PipelineConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline request failed: {0}")]
    Transport(String),

    #[error("Pipeline returned {status}: {body}")]
    Remote { status: u16, body: String },
}

/// Canonical record handed to the pipeline
///
/// Serialized with the variable names the agent task templates consume
/// (`ocr1`, `ocr2`, `context`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionInput {
    #[serde(rename = "ocr1")]
    pub primary_text: String,
    #[serde(rename = "ocr2")]
    pub secondary_text: String,
    pub context: String,
}

/// Anything that turns a [`CorrectionInput`] into corrected text
#[async_trait]
pub trait CorrectionPipeline: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &'static str;

    /// Run the pipeline once and return its result as plain text
    async fn invoke(&self, input: &CorrectionInput) -> Result<String, PipelineError>;
}

/// Pipeline reached over HTTP
///
/// Sends `POST {url}` with `{"inputs": {"ocr1", "ocr2", "context"}}`.
pub struct HttpCorrectionPipeline {
    http_client: reqwest::Client,
    url: String,
}

impl HttpCorrectionPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl CorrectionPipeline for HttpCorrectionPipeline {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn invoke(&self, input: &CorrectionInput) -> Result<String, PipelineError> {
        tracing::info!(
            url = %self.url,
            ocr1_len = input.primary_text.len(),
            ocr2_len = input.secondary_text.len(),
            "Invoking correction pipeline"
        );

        let response = self
            .http_client
            .post(&self.url)
            .json(&json!({ "inputs": input }))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(PipelineError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(coerce_output(&text))
    }
}

/// Coerce a pipeline reply into plain text
///
/// A JSON string is unwrapped; a mapping yields its `raw`, `result` or
/// `output` string (first present); any other JSON is serialized compactly;
/// a non-JSON body is returned as-is. `token_usage`, when reported, is
/// logged.
pub fn coerce_output(body: &str) -> String {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };

    match value {
        Value::String(text) => text,
        Value::Object(map) => {
            if let Some(usage) = map.get("token_usage") {
                tracing::info!(token_usage = %usage, "Pipeline token usage");
            }
            ["raw", "result", "output"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string())
        }
        other => other.to_string(),
    }
}
