use crate::actors::traits::LlmActor;
use crate::brain::Intent;
use crate::tasks::templates;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub intent: Intent,
    /// User text, possibly followed by extracted or transcript sections.
    pub content: String,
    /// The user's text exactly as received.
    pub original_query: String,
}

impl TaskRequest {
    pub fn new(intent: Intent, content: impl Into<String>, original_query: impl Into<String>) -> Self {
        Self {
            intent,
            content: content.into(),
            original_query: original_query.into(),
        }
    }
}

/// Outcome of a dispatched task. Failures are values, never panics or errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub task_label: String,
    pub result_text: String,
    pub is_error: bool,
}

/// Runs the template for an intent against the language model.
///
/// Holds no per-request state; clones share the same model handle and can
/// dispatch concurrently.
pub struct TaskDispatcher<L: LlmActor> {
    llm: Arc<L>,
}

impl<L: LlmActor> Clone for TaskDispatcher<L> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
        }
    }
}

impl<L: LlmActor> TaskDispatcher<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Builds the prompt, makes exactly one model call and wraps the outcome.
    ///
    /// Provider errors come back as a `TaskResult` with `is_error` set and the
    /// requested intent's label.
    #[instrument(skip(self, request), fields(intent = %request.intent))]
    pub async fn dispatch(&self, request: TaskRequest) -> TaskResult {
        info!("Executing task: {}", request.intent);

        let spec = templates::build(request.intent, &request.content, &request.original_query);

        match self.llm.complete(spec.prompt, spec.max_tokens).await {
            Ok(text) => {
                info!("Task {} completed successfully", spec.task_label);
                TaskResult {
                    task_label: spec.task_label.to_string(),
                    result_text: text,
                    is_error: false,
                }
            }
            Err(e) => {
                error!("Task execution failed: {}", e);
                TaskResult {
                    task_label: request.intent.label().to_string(),
                    result_text: format!("Error executing task: {}", e),
                    is_error: true,
                }
            }
        }
    }

    /// Dispatch by wire label. Unrecognised labels are handled as conversation.
    pub async fn dispatch_label(&self, label: &str, content: &str, original_query: &str) -> TaskResult {
        let intent = Intent::from_label(label).unwrap_or_else(|| {
            info!("Unknown task '{}', handling as conversational", label);
            Intent::Conversational
        });
        self.dispatch(TaskRequest::new(intent, content, original_query))
            .await
    }
}
