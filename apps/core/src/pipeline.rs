//! Request processing: extraction, transcript lookup, classification and dispatch.

use crate::actors::traits::LlmActor;
use crate::brain::{ClassificationInput, ClassificationResult, Intent, IntentClassifier};
use crate::error::AppError;
use crate::extract::{self, ExtractedContent, Extractors, Upload};
use crate::tasks::templates::{EXTRACTED_MARKER, TRANSCRIPT_MARKER};
use crate::tasks::{TaskDispatcher, TaskRequest, TaskResult};
use crate::youtube::{self, TranscriptFetcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Characters of extracted text echoed back in the response.
const EXTRACTED_PREVIEW_CHARS: usize = 500;
const TEXT_ONLY: &str = "text_only";

#[derive(Debug, Validate)]
struct TextInput {
    #[validate(length(max = 50000, message = "Text exceeds maximum length of 50000 characters"))]
    text: String,
}

/// Response metadata describing where the content came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    pub file_type: String,
    pub confidence: Option<f64>,
    pub pages: Option<usize>,
    pub duration: Option<f64>,
    pub language: Option<String>,
    pub method: Option<String>,
    pub warnings: Vec<String>,
    pub youtube: bool,
}

impl ResponseMetadata {
    fn new(extracted: Option<&ExtractedContent>, youtube: bool) -> Self {
        match extracted {
            Some(content) => Self {
                file_type: content.file_type.clone(),
                confidence: content.confidence,
                pages: content.pages,
                duration: content.duration,
                language: content.language.clone(),
                method: content.method.clone(),
                warnings: content.warnings.clone(),
                youtube,
            },
            None => Self {
                file_type: TEXT_ONLY.to_string(),
                confidence: None,
                pages: None,
                duration: None,
                language: None,
                method: None,
                warnings: Vec::new(),
                youtube,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub request_id: String,
    pub intent: Intent,
    pub confidence: f32,
    /// Label of the task that actually ran.
    pub task: String,
    pub extracted_content: String,
    pub result: String,
    pub is_error: bool,
    pub metadata: ResponseMetadata,
    pub processed_at: DateTime<Utc>,
}

/// Front door for a user request.
pub struct RequestProcessor<L: LlmActor> {
    classifier: IntentClassifier,
    dispatcher: TaskDispatcher<L>,
    extractors: Extractors,
    transcripts: Arc<dyn TranscriptFetcher>,
    max_upload_bytes: usize,
}

impl<L: LlmActor> Clone for RequestProcessor<L> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier,
            dispatcher: self.dispatcher.clone(),
            extractors: self.extractors.clone(),
            transcripts: Arc::clone(&self.transcripts),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

impl<L: LlmActor> RequestProcessor<L> {
    pub fn new(
        llm: Arc<L>,
        extractors: Extractors,
        transcripts: Arc<dyn TranscriptFetcher>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            dispatcher: TaskDispatcher::new(llm),
            extractors,
            transcripts,
            max_upload_bytes,
        }
    }

    pub fn dispatcher(&self) -> &TaskDispatcher<L> {
        &self.dispatcher
    }

    /// Handles one request end to end.
    ///
    /// Input problems and extraction failures are errors; a failing model call
    /// is not, it comes back as a response with `is_error` set.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn process(&self, text: String, upload: Option<Upload>) -> Result<ProcessResponse, AppError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());
        info!(
            "Processing request - Text length: {}, File: {}",
            text.chars().count(),
            upload.as_ref().map(|u| u.file_name.as_str()).unwrap_or("none")
        );

        let input = TextInput { text };
        input.validate()?;
        let text = input.text;

        if text.trim().is_empty() && upload.is_none() {
            return Err(AppError::Validation(
                "Either text or file must be provided".to_string(),
            ));
        }

        let extracted = match &upload {
            Some(upload) => Some(self.extract_upload(upload).await?),
            None => None,
        };

        let mut content = match &extracted {
            Some(extracted) if !extracted.text.is_empty() => {
                format!("{}\n\n{}\n{}", text, EXTRACTED_MARKER, extracted.text)
            }
            _ => text.clone(),
        };

        let youtube_url = youtube::extract_url(&text);
        let mut youtube = false;
        if let Some(url) = &youtube_url {
            if let Some(transcript) = self.transcripts.fetch_transcript(url).await {
                content.push_str(&format!("\n\n{}\n{}", TRANSCRIPT_MARKER, transcript));
                youtube = true;
            }
        }

        let has_attachment = upload.is_some() || youtube_url.is_some();
        let (classification, task) = self.run(&content, &text, has_attachment).await;

        info!("Request processed successfully");
        Ok(ProcessResponse {
            success: true,
            request_id,
            intent: classification.intent,
            confidence: classification.confidence,
            task: task.task_label,
            extracted_content: extracted
                .as_ref()
                .map(|e| e.text.chars().take(EXTRACTED_PREVIEW_CHARS).collect())
                .unwrap_or_default(),
            result: task.result_text,
            is_error: task.is_error,
            metadata: ResponseMetadata::new(extracted.as_ref(), youtube),
            processed_at: Utc::now(),
        })
    }

    /// Classify and dispatch text that has already been extracted.
    ///
    /// `attachment_text` is appended as an extracted section; its presence
    /// alone marks the request as carrying an attachment.
    pub async fn process_content(
        &self,
        text: &str,
        attachment_text: Option<&str>,
        original_query: &str,
    ) -> (ClassificationResult, TaskResult) {
        let content = match attachment_text {
            Some(extra) if !extra.is_empty() => format!("{}\n\n{}\n{}", text, EXTRACTED_MARKER, extra),
            _ => text.to_string(),
        };
        self.run(&content, original_query, attachment_text.is_some())
            .await
    }

    async fn extract_upload(&self, upload: &Upload) -> Result<ExtractedContent, AppError> {
        if upload.data.len() > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                size: upload.data.len(),
                limit: self.max_upload_bytes,
            });
        }
        let kind = extract::resolve_kind(upload)?;
        let extracted = self.extractors.extract(kind, upload).await?;
        info!(
            "File processed successfully. Extracted {} characters",
            extracted.text.chars().count()
        );
        Ok(extracted)
    }

    /// The intent is decided on the user's own words; the model sees the full content.
    async fn run(
        &self,
        content: &str,
        original_query: &str,
        has_attachment: bool,
    ) -> (ClassificationResult, TaskResult) {
        let classification = self
            .classifier
            .analyze(ClassificationInput::new(original_query, has_attachment));
        info!("Detected intent: {}", classification.intent);

        let task = self
            .dispatcher
            .dispatch(TaskRequest::new(classification.intent, content, original_query))
            .await;
        (classification, task)
    }
}
