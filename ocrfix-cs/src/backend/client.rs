//! HTTP client for the records backend
//!
//! Returns parsed JSON together with the HTTP status. Transport failures
//! (timeout, DNS, refused connection) become [`ClientError::Transport`];
//! non-2xx answers are data, turned into [`ClientError::RemoteApi`] only
//! when a caller asks for success via [`ApiResponse::into_success`].

use ocrfix_common::config::BackendConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("ocrfix-cs/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("API request error: {0}")]
    Transport(String),

    #[error("API error: {status} - {body}")]
    RemoteApi { status: u16, body: String },
}

/// A backend answer: status plus body
///
/// JSON bodies are parsed; anything else is kept as `Value::String`, and an
/// empty body is `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn from_text(status: u16, text: String) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx answer, or `RemoteApi` carrying the body text
    pub fn into_success(self) -> Result<Value, ClientError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ClientError::RemoteApi {
                status: self.status,
                body: body_text(&self.body),
            })
        }
    }
}

/// Render a body the way it arrived on the wire (strings unquoted)
pub fn body_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Uninterpreted answer, for diagnostics
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// Result of probing the backend root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Connected,
    Error { status: u16 },
    Disconnected { reason: String },
}

/// Records backend client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: config.health_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path (`path` starts with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL with the query encoded the way requests send it
    pub fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> String {
        let url = self.url(path);
        match reqwest::Url::parse_with_params(&url, query) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => url,
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .get(self.url(path))
            .query(query)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(request).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .post(self.url(path))
            .json(body)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(request).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .put(self.url(path))
            .json(body)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(request).await
    }

    async fn execute(&self, request: reqwest::Request) -> Result<ApiResponse, ClientError> {
        let method = request.method().clone();
        let url = request.url().to_string();
        tracing::debug!(method = %method, url = %url, "Calling backend");

        let response = self.http_client.execute(request).await.map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "Backend request failed");
            ClientError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        tracing::debug!(method = %method, url = %url, status, bytes = text.len(), "Backend responded");
        Ok(ApiResponse::from_text(status, text))
    }

    /// Fetch without interpreting the answer; used by diagnostic routes
    pub async fn fetch_raw(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<RawResponse, ClientError> {
        let request = self
            .http_client
            .get(self.url(path))
            .query(query)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let url = request.url().to_string();

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let parsed = ApiResponse::from_text(status, text);
        Ok(RawResponse {
            url,
            status,
            headers,
            body: parsed.body,
        })
    }

    /// Probe the backend root with the health timeout
    pub async fn check_health(&self) -> BackendHealth {
        let result = self
            .http_client
            .get(self.url("/"))
            .timeout(self.health_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().as_u16() == 200 => BackendHealth::Connected,
            Ok(response) => BackendHealth::Error {
                status: response.status().as_u16(),
            },
            Err(e) => BackendHealth::Disconnected {
                reason: e.to_string(),
            },
        }
    }
}
