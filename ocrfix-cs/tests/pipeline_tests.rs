//! HTTP correction pipeline tests against a local endpoint
//!
//! Tests cover:
//! - Request shape (`POST {"inputs": {"ocr1", "ocr2", "context"}}`)
//! - Reply coercion for structured and plain-text answers
//! - Non-2xx replies and unreachable endpoints

mod helpers;

use axum::http::Method;
use helpers::{unreachable_base_url, MockPipelineEndpoint};
use ocrfix_common::config::PipelineConfig;
use ocrfix_cs::pipeline::{CorrectionInput, CorrectionPipeline, HttpCorrectionPipeline, PipelineError};
use serde_json::json;

fn sample_input() -> CorrectionInput {
    CorrectionInput {
        primary_text: "Photosynthesis convrts light".to_string(),
        secondary_text: "Photosynthesis converts light".to_string(),
        context: "Biology paper 1".to_string(),
    }
}

fn pipeline_for(url: &str) -> HttpCorrectionPipeline {
    HttpCorrectionPipeline::new(&PipelineConfig {
        url: url.to_string(),
        timeout_secs: Some(10),
    })
    .unwrap()
}

#[tokio::test]
async fn test_invoke_posts_inputs_and_returns_raw_text() {
    let endpoint = MockPipelineEndpoint::start(
        200,
        r#"{"raw": "Photosynthesis converts light", "token_usage": {"total_tokens": 42}}"#,
    )
    .await;

    let result = pipeline_for(&endpoint.url)
        .invoke(&sample_input())
        .await
        .unwrap();
    assert_eq!(result, "Photosynthesis converts light");

    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/kickoff");
    assert_eq!(
        requests[0].body,
        json!({
            "inputs": {
                "ocr1": "Photosynthesis convrts light",
                "ocr2": "Photosynthesis converts light",
                "context": "Biology paper 1"
            }
        })
    );
}

#[tokio::test]
async fn test_plain_text_reply_is_returned_verbatim() {
    let endpoint = MockPipelineEndpoint::start(200, "Q1: light energy").await;

    let result = pipeline_for(&endpoint.url)
        .invoke(&sample_input())
        .await
        .unwrap();
    assert_eq!(result, "Q1: light energy");
}

#[tokio::test]
async fn test_server_error_is_remote_error() {
    let endpoint = MockPipelineEndpoint::start(503, "agents busy").await;

    let err = pipeline_for(&endpoint.url)
        .invoke(&sample_input())
        .await
        .unwrap_err();

    match err {
        PipelineError::Remote { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "agents busy");
        }
        other => panic!("expected Remote, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let url = format!("{}/kickoff", unreachable_base_url().await);

    let err = pipeline_for(&url)
        .invoke(&sample_input())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transport(_)));
    assert!(err.to_string().starts_with("Pipeline request failed:"));
}
