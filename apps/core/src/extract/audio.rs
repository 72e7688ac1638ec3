use super::capabilities::{Extraction, Transcriber};
use super::ExtractedContent;
use crate::error::AppError;
use std::path::Path;
use tracing::{error, info};

pub const FILE_TYPE: &str = "audio_transcription";

pub async fn extract(path: &Path, transcriber: &dyn Transcriber) -> Result<ExtractedContent, AppError> {
    let outcome = transcriber.transcribe(path).await.map_err(|e| {
        error!("Audio transcription error: {}", e);
        AppError::Extraction(format!("Audio transcription failed: {}", e))
    })?;

    match outcome {
        Extraction::Done(transcription) => {
            info!(
                chars = transcription.text.chars().count(),
                language = transcription.language.as_deref().unwrap_or("unknown"),
                "Audio transcription complete"
            );
            Ok(ExtractedContent {
                text: transcription.text,
                file_type: FILE_TYPE.to_string(),
                duration: transcription.duration,
                language: transcription.language,
                ..Default::default()
            })
        }
        Extraction::Unavailable { reason } => Err(AppError::Extraction(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::capabilities::{Transcription, Unavailable};
    use async_trait::async_trait;

    struct FixedTranscriber(Result<Transcription, AppError>);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Extraction<Transcription>, AppError> {
            self.0.clone().map(Extraction::Done)
        }
    }

    #[tokio::test]
    async fn test_transcription_metadata() {
        let transcriber = FixedTranscriber(Ok(Transcription {
            text: "Let's ship on Friday.".to_string(),
            language: Some("en".to_string()),
            duration: Some(3.5),
        }));
        let content = extract(Path::new("memo.mp3"), &transcriber).await.unwrap();
        assert_eq!(content.file_type, "audio_transcription");
        assert_eq!(content.text, "Let's ship on Friday.");
        assert_eq!(content.language.as_deref(), Some("en"));
        assert_eq!(content.duration, Some(3.5));
    }

    #[tokio::test]
    async fn test_tool_failure_is_wrapped() {
        let transcriber = FixedTranscriber(Err(AppError::Extraction("whisper exited with 1".to_string())));
        let err = extract(Path::new("memo.mp3"), &transcriber).await.unwrap_err();
        assert!(err.to_string().contains("Audio transcription failed"));
    }

    #[tokio::test]
    async fn test_missing_transcriber_is_an_error() {
        let transcriber = Unavailable::new("Whisper not available. Please install openai-whisper");
        let err = extract(Path::new("memo.mp3"), &transcriber).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
