use super::capabilities::{Extraction, OcrEngine, PdfRasterizer};
use super::ExtractedContent;
use crate::error::AppError;
use regex::bytes::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

pub const TEXT_FILE_TYPE: &str = "pdf_text";
pub const OCR_FILE_TYPE: &str = "pdf_ocr";

/// Below this many characters a PDF is treated as scanned.
const MIN_TEXT_CHARS: usize = 50;
const OCR_UNAVAILABLE_WARNING: &str = "Limited text extracted. OCR not available.";

static PAGE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Type\s*/Page[^s]").expect("Invalid regex: page object"));

/// Text layer first; scanned documents fall back to rasterize + OCR.
pub async fn extract(
    path: &Path,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PdfRasterizer,
) -> Result<ExtractedContent, AppError> {
    let data = tokio::fs::read(path).await?;
    let pages = count_pages(&data);

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await?
        .map_err(|e| AppError::Extraction(format!("PDF processing failed: {}", e)))?;
    let text = clean_extracted_text(&text);

    if text.chars().count() >= MIN_TEXT_CHARS {
        info!("PDF processed. Extracted {} characters from {} pages", text.len(), pages);
        return Ok(ExtractedContent {
            text,
            file_type: TEXT_FILE_TYPE.to_string(),
            pages: Some(pages),
            method: Some("text_extraction".to_string()),
            ..Default::default()
        });
    }

    warn!("PDF appears to be scanned. Attempting OCR...");
    match ocr_pages(path, ocr, rasterizer).await {
        Ok(Some(ocr_text)) => Ok(ExtractedContent {
            text: ocr_text,
            file_type: OCR_FILE_TYPE.to_string(),
            pages: Some(pages),
            method: Some("ocr_fallback".to_string()),
            ..Default::default()
        }),
        Ok(None) => Ok(limited(text, pages, OCR_UNAVAILABLE_WARNING.to_string())),
        Err(e) => {
            warn!("OCR fallback failed: {}", e);
            Ok(limited(text, pages, format!("OCR fallback failed: {}", e)))
        }
    }
}

fn limited(text: String, pages: usize, warning: String) -> ExtractedContent {
    ExtractedContent {
        text,
        file_type: TEXT_FILE_TYPE.to_string(),
        pages: Some(pages),
        warnings: vec![warning],
        ..Default::default()
    }
}

/// Renders every page and OCRs it. `None` when either tool is missing.
async fn ocr_pages(
    path: &Path,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PdfRasterizer,
) -> Result<Option<String>, AppError> {
    let work_dir = tempfile::tempdir()?;
    let images = match rasterizer.rasterize(path, work_dir.path()).await? {
        Extraction::Done(images) => images,
        Extraction::Unavailable { reason } => {
            warn!("{}", reason);
            return Ok(None);
        }
    };

    let mut text = String::new();
    for (index, image) in images.iter().enumerate() {
        info!("OCR on page {}/{}", index + 1, images.len());
        match ocr.recognize(image).await? {
            Extraction::Done(output) => {
                text.push_str(&output.text);
                text.push_str("\n\n");
            }
            Extraction::Unavailable { reason } => {
                warn!("{}", reason);
                return Ok(None);
            }
        }
    }
    Ok(Some(text.trim().to_string()))
}

/// Counts `/Type /Page` objects, excluding the `/Pages` tree nodes.
pub fn count_pages(data: &[u8]) -> usize {
    PAGE_OBJECT.find_iter(data).count()
}

fn clean_extracted_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
