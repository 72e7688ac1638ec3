//! Extraction collaborators: turn an uploaded image, PDF or audio file into text.
//!
//! The core only reads `ExtractedContent::text` plus a few metadata fields; how
//! the text is produced is up to the injected capability providers.

pub mod audio;
pub mod capabilities;
pub mod image;
pub mod pdf;

use crate::error::AppError;
use capabilities::{
    OcrEngine, PdfRasterizer, PopplerRasterizer, TesseractOcr, Transcriber, Unavailable, WhisperCli,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Content types accepted on upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/bmp",
    "image/gif",
    "application/pdf",
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/m4a",
    "audio/ogg",
];

/// Broad category of an upload, deciding which extractor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Audio,
}

impl FileKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_lowercase();
        if content_type.starts_with("image/") {
            Some(FileKind::Image)
        } else if content_type == "application/pdf" {
            Some(FileKind::Pdf)
        } else if content_type.starts_with("audio/") {
            Some(FileKind::Audio)
        } else {
            None
        }
    }

    /// File extensions expected for this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Image => &["jpg", "jpeg", "png", "bmp", "gif", "tiff"],
            FileKind::Pdf => &["pdf"],
            FileKind::Audio => &["mp3", "wav", "m4a", "ogg", "flac"],
        }
    }
}

/// An uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    /// Extension of the original file name, lowercased, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase())
    }
}

/// Text pulled out of an upload, plus the metadata passed back to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedContent {
    pub text: String,
    /// `image_ocr`, `pdf_text`, `pdf_ocr` or `audio_transcription`.
    pub file_type: String,
    pub confidence: Option<f64>,
    pub pages: Option<usize>,
    pub duration: Option<f64>,
    pub language: Option<String>,
    pub method: Option<String>,
    pub warnings: Vec<String>,
}

/// Decide how to handle an upload.
///
/// The content type must be on the allow list. When the client sent nothing
/// useful, the type is sniffed from the leading bytes and checked the same way.
pub fn resolve_kind(upload: &Upload) -> Result<FileKind, AppError> {
    let declared = upload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream");

    if let Some(content_type) = declared {
        if !ALLOWED_MIME_TYPES.contains(&content_type.to_lowercase().as_str()) {
            return Err(unsupported(content_type));
        }
        return FileKind::from_content_type(content_type).ok_or_else(|| unsupported(content_type));
    }

    match infer::get(&upload.data) {
        Some(kind) => {
            let mime = kind.mime_type();
            info!("Sniffed upload type: {}", mime);
            if !ALLOWED_MIME_TYPES.contains(&mime) {
                return Err(unsupported(mime));
            }
            FileKind::from_content_type(mime).ok_or_else(|| unsupported(mime))
        }
        None => Err(unsupported("unknown")),
    }
}

fn unsupported(content_type: &str) -> AppError {
    AppError::UnsupportedMedia(format!(
        "File type '{}' is not supported. Allowed types: images, PDFs, and audio files.",
        content_type
    ))
}

/// Checks a file on disk: it exists, is non-empty, and carries an extension
/// expected for `kind`.
pub fn validate_file(path: &Path, kind: FileKind) -> bool {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => {
            warn!("File not found: {}", path.display());
            return false;
        }
    };
    if size == 0 {
        warn!("File is empty: {}", path.display());
        return false;
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    if !kind.extensions().contains(&extension.as_str()) {
        warn!("Unexpected file extension .{} for {:?}", extension, kind);
        return false;
    }
    true
}

/// Bundles the capability providers and routes uploads to the right extractor.
#[derive(Clone)]
pub struct Extractors {
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PdfRasterizer>,
    transcriber: Arc<dyn Transcriber>,
}

impl Extractors {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PdfRasterizer>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            ocr,
            rasterizer,
            transcriber,
        }
    }

    /// Picks CLI-backed engines for every tool found in PATH, `Unavailable` for the rest.
    pub fn detect() -> Self {
        let ocr: Arc<dyn OcrEngine> = match TesseractOcr::detect() {
            Some(engine) => Arc::new(engine),
            None => Arc::new(Unavailable::new(
                "OCR not available. Please install tesseract-ocr",
            )),
        };
        let rasterizer: Arc<dyn PdfRasterizer> = match PopplerRasterizer::detect() {
            Some(engine) => Arc::new(engine),
            None => Arc::new(Unavailable::new(
                "PDF rasterizing not available. Please install poppler-utils",
            )),
        };
        let transcriber: Arc<dyn Transcriber> = match WhisperCli::detect() {
            Some(engine) => Arc::new(engine),
            None => Arc::new(Unavailable::new(
                "Whisper not available. Please install openai-whisper",
            )),
        };
        Self::new(ocr, rasterizer, transcriber)
    }

    /// Writes the upload to a temporary file and runs the extractor for `kind`.
    /// The temporary file is removed when this returns.
    pub async fn extract(&self, kind: FileKind, upload: &Upload) -> Result<ExtractedContent, AppError> {
        let suffix = upload
            .extension()
            .or_else(|| kind.extensions().first().map(|ext| ext.to_string()))
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut tmp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile()?;
        tmp.write_all(&upload.data)?;
        tmp.flush()?;

        if !validate_file(tmp.path(), kind) {
            warn!("Upload {} did not pass file validation; extracting anyway", upload.file_name);
        }

        info!("Processing file: {} ({:?})", upload.file_name, kind);
        let result = match kind {
            FileKind::Image => image::extract(tmp.path(), self.ocr.as_ref()).await,
            FileKind::Pdf => pdf::extract(tmp.path(), self.ocr.as_ref(), self.rasterizer.as_ref()).await,
            FileKind::Audio => audio::extract(tmp.path(), self.transcriber.as_ref()).await,
        };

        if let Err(e) = tmp.close() {
            warn!("Failed to cleanup temp file: {}", e);
        }
        result
    }
}
