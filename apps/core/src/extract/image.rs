use super::capabilities::{Extraction, OcrEngine};
use super::ExtractedContent;
use crate::error::AppError;
use std::path::Path;
use tracing::info;

pub const FILE_TYPE: &str = "image_ocr";

/// OCR a single image. A missing OCR engine is an error here: an image has no
/// other source of text.
pub async fn extract(path: &Path, ocr: &dyn OcrEngine) -> Result<ExtractedContent, AppError> {
    match ocr.recognize(path).await? {
        Extraction::Done(output) => {
            info!(
                chars = output.text.chars().count(),
                confidence = output.confidence,
                "Image OCR complete"
            );
            Ok(ExtractedContent {
                text: output.text,
                file_type: FILE_TYPE.to_string(),
                confidence: Some(output.confidence),
                ..Default::default()
            })
        }
        Extraction::Unavailable { reason } => Err(AppError::Extraction(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::capabilities::{OcrOutput, Unavailable};
    use async_trait::async_trait;

    struct FixedOcr;

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _image_path: &Path) -> Result<Extraction<OcrOutput>, AppError> {
            Ok(Extraction::Done(OcrOutput {
                text: "INVOICE #42".to_string(),
                confidence: 93.1,
            }))
        }
    }

    #[tokio::test]
    async fn test_image_ocr_result() {
        let content = extract(Path::new("scan.png"), &FixedOcr).await.unwrap();
        assert_eq!(content.text, "INVOICE #42");
        assert_eq!(content.file_type, "image_ocr");
        assert_eq!(content.confidence, Some(93.1));
        assert!(content.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ocr_is_an_error() {
        let ocr = Unavailable::new("OCR not available. Please install tesseract-ocr");
        let err = extract(Path::new("scan.png"), &ocr).await.unwrap_err();
        assert!(err.to_string().contains("OCR not available"));
    }
}
