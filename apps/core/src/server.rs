//! HTTP surface.

use crate::actors::traits::LlmActor;
use crate::cost::{self, CostEstimate};
use crate::error::AppError;
use crate::extract::Upload;
use crate::pipeline::{ProcessResponse, RequestProcessor};
use crate::preflight::PreflightReport;
use crate::tasks::TaskResult;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use validator::Validate;

const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Room for the text field and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared handler state.
pub struct AppState<L: LlmActor> {
    pub processor: RequestProcessor<L>,
    pub preflight: Arc<PreflightReport>,
    pub max_upload_bytes: usize,
}

impl<L: LlmActor> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            processor: self.processor.clone(),
            preflight: Arc::clone(&self.preflight),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

impl<L: LlmActor> AppState<L> {
    /// Largest request body the router accepts.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn router<L: LlmActor>(state: AppState<L>) -> Router {
    let body_limit = state.body_limit();
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health::<L>))
        .route("/api/process", post(process::<L>))
        .route("/api/estimate-cost", post(estimate_cost::<L>))
        .route("/api/execute", post(execute::<L>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serves until `shutdown` resolves.
pub async fn serve<L, F>(listener: TcpListener, state: AppState<L>, shutdown: F) -> std::io::Result<()>
where
    L: LlmActor,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Multi-modal task router",
        "version": VERSION,
        "status": "operational",
    }))
}

async fn health<L: LlmActor>(State(state): State<AppState<L>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": VERSION,
        "services": {
            "intent_detector": "active",
            "file_processor": "active",
            "task_executor": "active",
        },
        "capabilities": state.preflight.capabilities(),
        "summary": state.preflight.summary,
    }))
}

async fn process<L: LlmActor>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError> {
    let mut text = String::new();
    let mut upload = None;

    while let Some(field) = next_field(&mut multipart, &headers, state.max_upload_bytes).await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => {
                text = field
                    .text()
                    .await
                    .map_err(|e| form_error(e, &headers, state.max_upload_bytes))?;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| form_error(e, &headers, state.max_upload_bytes))?;
                // Browsers send an empty, unnamed part when no file was picked.
                if !data.is_empty() || !file_name.is_empty() {
                    upload = Some(Upload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let response = state.processor.process(text, upload).await?;
    Ok(Json(response))
}

async fn estimate_cost<L: LlmActor>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<CostEstimate>, AppError> {
    let limit = state.body_limit();
    let mut text = String::new();
    let mut file_size: u64 = 0;

    while let Some(field) = next_field(&mut multipart, &headers, limit).await? {
        let name = field.name().map(str::to_string);
        let value = field
            .text()
            .await
            .map_err(|e| form_error(e, &headers, limit))?;
        match name.as_deref() {
            Some("text") => text = value,
            Some("file_size") if !value.trim().is_empty() => {
                file_size = value
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Validation("file_size must be a non-negative integer".to_string()))?;
            }
            _ => {}
        }
    }

    Ok(Json(cost::estimate_cost(&text, file_size)))
}

#[derive(Debug, Deserialize, Validate)]
struct ExecuteRequest {
    #[validate(length(min = 1))]
    task: String,
    #[validate(length(max = 50000))]
    content: String,
    #[serde(default)]
    query: Option<String>,
}

/// Runs a named task directly, skipping classification.
async fn execute<L: LlmActor>(
    State(state): State<AppState<L>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<TaskResult>, AppError> {
    request.validate()?;
    let query = request.query.as_deref().unwrap_or(&request.content);
    let result = state
        .processor
        .dispatcher()
        .dispatch_label(&request.task, &request.content, query)
        .await;
    Ok(Json(result))
}

async fn next_field<'a>(
    multipart: &'a mut Multipart,
    headers: &HeaderMap,
    limit: usize,
) -> Result<Option<axum::extract::multipart::Field<'a>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, headers, limit))
}

fn form_error(err: MultipartError, headers: &HeaderMap, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(limit);
        return AppError::PayloadTooLarge { size, limit };
    }
    AppError::Validation(format!("Invalid form data: {}", err.body_text()))
}
