//! HTTP Surface Tests
//!
//! Spins the router up on an ephemeral port and talks to it over real HTTP.

use crate::error::AppError;
use crate::preflight::{CheckResult, PreflightReport, API_KEY_CHECK, OCR_CHECK};
use crate::server::{self, AppState};
use crate::tests::actor_tests::MockLlmActor;
use crate::tests::pipeline_tests::{processor, StaticTranscripts, PNG_MAGIC};
use axum::response::IntoResponse;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

fn report() -> PreflightReport {
    PreflightReport {
        all_passed: false,
        checks: vec![
            CheckResult {
                name: API_KEY_CHECK.to_string(),
                passed: true,
                message: "API key present".to_string(),
                details: None,
            },
            CheckResult {
                name: OCR_CHECK.to_string(),
                passed: false,
                message: "tesseract not found".to_string(),
                details: None,
            },
        ],
        summary: "Some optional tools are missing.".to_string(),
    }
}

/// Starts a server and returns its base URL.
async fn spawn_app(llm: MockLlmActor, max_upload_bytes: usize) -> String {
    let state = AppState {
        processor: processor(Arc::new(llm), Arc::new(StaticTranscripts::default()), max_upload_bytes),
        preflight: Arc::new(report()),
        max_upload_bytes,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, state, std::future::pending()));
    format!("http://{}", addr)
}

#[cfg(test)]
mod info_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_root() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;

        let body: Value = reqwest::get(format!("{}/", base)).await.unwrap().json().await.unwrap();

        assert_eq!(body["status"], "operational");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_capabilities() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;

        let body: Value = reqwest::get(format!("{}/api/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["task_executor"], "active");
        assert_eq!(body["capabilities"][API_KEY_CHECK], true);
        assert_eq!(body["capabilities"][OCR_CHECK], false);
    }
}

#[cfg(test)]
mod process_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_text_only() {
        let base = spawn_app(MockLlmActor::new("**Action Items:**\n1. Ship"), 1024).await;
        let form = Form::new().text("text", "What are the next steps?");

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["intent"], "action_items");
        assert_eq!(body["task"], "action_items");
        assert_eq!(body["result"], "**Action Items:**\n1. Ship");
        assert_eq!(body["metadata"]["file_type"], "text_only");
    }

    #[tokio::test]
    async fn test_image_upload() {
        let base = spawn_app(MockLlmActor::new("Here is a summary"), 1024).await;
        let part = Part::bytes(PNG_MAGIC.to_vec())
            .file_name("chart.png")
            .mime_str("image/png")
            .unwrap();
        let form = Form::new().text("text", "summarize the chart").part("file", part);

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["intent"], "summarization");
        assert_eq!(body["metadata"]["file_type"], "image_ocr");
        assert_eq!(body["extracted_content"], "Quarterly revenue grew 12%");
    }

    #[tokio::test]
    async fn test_empty_request_is_400() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(Form::new().text("text", ""))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "detail": "Either text or file must be provided" }));
    }

    #[tokio::test]
    async fn test_unsupported_file_is_415() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;
        let part = Part::bytes(b"plain words".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap();

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(Form::new().text("text", "read it").part("file", part))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: Value = res.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("text/plain"));
    }

    #[tokio::test]
    async fn test_oversized_file_is_413() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;
        let part = Part::bytes(vec![0u8; 4096])
            .file_name("big.png")
            .mime_str("image/png")
            .unwrap();

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(Form::new().text("text", "hi").part("file", part))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = res.json().await.unwrap();
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("File size (0.00MB) exceeds maximum allowed size"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_still_200() {
        let base = spawn_app(MockLlmActor::failing(), 1024).await;

        let res = reqwest::Client::new()
            .post(format!("{}/api/process", base))
            .multipart(Form::new().text("text", "hello"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["is_error"], true);
    }
}

#[cfg(test)]
mod estimate_cost_tests {
    use super::*;

    #[tokio::test]
    async fn test_estimate() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;
        let form = Form::new().text("text", "a".repeat(4000)).text("file_size", "0");

        let res = reqwest::Client::new()
            .post(format!("{}/api/estimate-cost", base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["estimated_input_tokens"], 1500);
        assert_eq!(body["estimated_output_tokens"], 500);
        assert_eq!(body["estimated_cost_usd"], 0.012);
    }

    #[tokio::test]
    async fn test_body_limit_is_reported_in_megabytes() {
        let state = AppState {
            processor: processor(
                Arc::new(MockLlmActor::new("ok")),
                Arc::new(StaticTranscripts::default()),
                1024,
            ),
            preflight: Arc::new(report()),
            max_upload_bytes: 1024,
        };
        assert_eq!(state.body_limit(), 1024 + 1024 * 1024);

        let response = AppError::PayloadTooLarge {
            size: 3 * 1024 * 1024,
            limit: state.body_limit(),
        }
        .into_response();
        assert_eq!(response.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["detail"],
            "File size (3.00MB) exceeds maximum allowed size (1MB)"
        );
    }

    #[tokio::test]
    async fn test_bad_file_size_is_400() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;
        let form = Form::new().text("text", "x").text("file_size", "-5");

        let res = reqwest::Client::new()
            .post(format!("{}/api/estimate-cost", base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod execute_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_named_task() {
        let base = spawn_app(MockLlmActor::new("**Purpose:** adds"), 1024).await;

        let res = reqwest::Client::new()
            .post(format!("{}/api/execute", base))
            .json(&json!({ "task": "code_explanation", "content": "fn add(a: i32) -> i32 { a }" }))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["task_label"], "code_explanation");
        assert_eq!(body["result_text"], "**Purpose:** adds");
        assert_eq!(body["is_error"], false);
    }

    #[tokio::test]
    async fn test_unknown_task_is_conversational() {
        let base = spawn_app(MockLlmActor::new("hola"), 1024).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/execute", base))
            .json(&json!({ "task": "translation", "content": "hello", "query": "say hello in Spanish" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["task_label"], "conversational");
    }

    #[tokio::test]
    async fn test_empty_task_is_400() {
        let base = spawn_app(MockLlmActor::new("ok"), 1024).await;

        let res = reqwest::Client::new()
            .post(format!("{}/api/execute", base))
            .json(&json!({ "task": "", "content": "hello" }))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
