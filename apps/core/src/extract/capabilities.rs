//! Capability providers for the native tools behind extraction.
//!
//! Each capability is a trait injected into the extractors. Engines are picked
//! once at startup; a missing tool is represented by [`Unavailable`], whose
//! calls answer [`Extraction::Unavailable`] instead of failing.

use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

pub const TESSERACT_BINARY: &str = "tesseract";
pub const WHISPER_BINARY: &str = "whisper";
pub const PDFTOPPM_BINARY: &str = "pdftoppm";

const WHISPER_MODEL: &str = "base";
const RASTER_DPI: &str = "300";

/// Either the capability produced a value, or it is not installed.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Done(T),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    /// Mean word confidence reported by the engine, 0-100.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub text: String,
    pub language: Option<String>,
    pub duration: Option<f64>,
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_path: &Path) -> Result<Extraction<OcrOutput>, AppError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Extraction<Transcription>, AppError>;
}

/// Renders PDF pages to images for OCR.
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    async fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> Result<Extraction<Vec<PathBuf>>, AppError>;
}

/// Stand-in for a capability whose tool is not installed.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn answer<T>(&self) -> Result<Extraction<T>, AppError> {
        Ok(Extraction::Unavailable {
            reason: self.reason.clone(),
        })
    }
}

#[async_trait]
impl OcrEngine for Unavailable {
    async fn recognize(&self, _image_path: &Path) -> Result<Extraction<OcrOutput>, AppError> {
        self.answer()
    }
}

#[async_trait]
impl Transcriber for Unavailable {
    async fn transcribe(&self, _audio_path: &Path) -> Result<Extraction<Transcription>, AppError> {
        self.answer()
    }
}

#[async_trait]
impl PdfRasterizer for Unavailable {
    async fn rasterize(&self, _pdf_path: &Path, _out_dir: &Path) -> Result<Extraction<Vec<PathBuf>>, AppError> {
        self.answer()
    }
}

/// OCR through the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    /// Looks the binary up in PATH.
    pub fn detect() -> Option<Self> {
        which::which(TESSERACT_BINARY).ok().map(|binary| Self { binary })
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image_path: &Path) -> Result<Extraction<OcrOutput>, AppError> {
        let text = run_tool(&self.binary, &[image_path.as_os_str(), OsStr::new("stdout")]).await?;
        let tsv = run_tool(
            &self.binary,
            &[image_path.as_os_str(), OsStr::new("stdout"), OsStr::new("tsv")],
        )
        .await?;

        Ok(Extraction::Done(OcrOutput {
            text: text.trim().to_string(),
            confidence: mean_tsv_confidence(&tsv),
        }))
    }
}

/// Speech-to-text through the `whisper` command line tool.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    binary: PathBuf,
}

impl WhisperCli {
    pub fn detect() -> Option<Self> {
        which::which(WHISPER_BINARY).ok().map(|binary| Self { binary })
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(&self, audio_path: &Path) -> Result<Extraction<Transcription>, AppError> {
        let out_dir = tempfile::tempdir()?;
        info!("Transcribing audio with whisper ({} model)...", WHISPER_MODEL);

        run_tool(
            &self.binary,
            &[
                audio_path.as_os_str(),
                OsStr::new("--model"),
                OsStr::new(WHISPER_MODEL),
                OsStr::new("--output_format"),
                OsStr::new("json"),
                OsStr::new("--output_dir"),
                out_dir.path().as_os_str(),
            ],
        )
        .await?;

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| AppError::Extraction("Audio file has no name".to_string()))?;
        let json_path = out_dir
            .path()
            .join(format!("{}.json", stem.to_string_lossy()));
        let raw = tokio::fs::read_to_string(&json_path).await?;

        parse_whisper_json(&raw).map(Extraction::Done)
    }
}

/// Page rendering through poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    binary: PathBuf,
}

impl PopplerRasterizer {
    pub fn detect() -> Option<Self> {
        which::which(PDFTOPPM_BINARY).ok().map(|binary| Self { binary })
    }
}

#[async_trait]
impl PdfRasterizer for PopplerRasterizer {
    async fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> Result<Extraction<Vec<PathBuf>>, AppError> {
        let prefix = out_dir.join("page");
        run_tool(
            &self.binary,
            &[
                OsStr::new("-r"),
                OsStr::new(RASTER_DPI),
                OsStr::new("-png"),
                pdf_path.as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .await?;

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                pages.push(path);
            }
        }
        // pdftoppm zero-pads page numbers, so lexical order is page order.
        pages.sort();
        Ok(Extraction::Done(pages))
    }
}

async fn run_tool(binary: &Path, args: &[&OsStr]) -> Result<String, AppError> {
    debug!("Running {:?} {:?}", binary, args);
    let output = Command::new(binary).args(args).output().await?;

    if !output.status.success() {
        return Err(AppError::Extraction(format!(
            "{} exited with {}: {}",
            binary.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Mean of the per-word confidences in tesseract's TSV output, rounded to two
/// decimals. Rows with confidence -1 are layout rows and are skipped.
pub fn mean_tsv_confidence(tsv: &str) -> f64 {
    let confidences: Vec<f64> = tsv
        .lines()
        .skip(1)
        .filter_map(|line| line.split('\t').nth(10))
        .filter_map(|conf| conf.trim().parse::<f64>().ok())
        .filter(|conf| *conf >= 0.0)
        .collect();

    if confidences.is_empty() {
        return 0.0;
    }
    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[derive(Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    end: f64,
}

/// Reads whisper's JSON output. Duration is the end of the last segment.
pub fn parse_whisper_json(raw: &str) -> Result<Transcription, AppError> {
    let output: WhisperOutput = serde_json::from_str(raw)
        .map_err(|e| AppError::Extraction(format!("Unreadable transcription output: {}", e)))?;

    Ok(Transcription {
        text: output.text.trim().to_string(),
        language: output.language,
        duration: output.segments.last().map(|segment| segment.end),
    })
}
