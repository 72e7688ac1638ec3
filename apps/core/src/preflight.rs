//! Preflight Check System
//!
//! Verifies at startup which capabilities this host can offer. The report is
//! logged once and served by the health endpoint.

use crate::config::ServiceConfig;
use crate::extract::capabilities::{PDFTOPPM_BINARY, TESSERACT_BINARY, WHISPER_BINARY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const API_KEY_CHECK: &str = "anthropic_api_key";
pub const OCR_CHECK: &str = "ocr";
pub const PDF_RASTER_CHECK: &str = "pdf_rasterizer";
pub const TRANSCRIPTION_CHECK: &str = "audio_transcription";

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details,
        }
    }

    fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete preflight check report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightReport {
    pub all_passed: bool,
    pub checks: Vec<CheckResult>,
    pub summary: String,
}

impl PreflightReport {
    fn from_checks(checks: Vec<CheckResult>) -> Self {
        let all_passed = checks.iter().all(|c| c.passed);
        let api_ready = checks
            .iter()
            .any(|c| c.name == API_KEY_CHECK && c.passed);

        let summary = if all_passed {
            "All checks passed. System ready.".to_string()
        } else if api_ready {
            "Some optional tools are missing. Affected file types will fail to process.".to_string()
        } else {
            "No usable API key. Every task will fail.".to_string()
        };

        Self {
            all_passed,
            checks,
            summary,
        }
    }

    /// Check name to pass/fail, for the health endpoint.
    pub fn capabilities(&self) -> BTreeMap<String, bool> {
        self.checks
            .iter()
            .map(|c| (c.name.clone(), c.passed))
            .collect()
    }
}

/// Performs all preflight checks and returns a report
pub fn run_preflight_checks(config: &ServiceConfig) -> PreflightReport {
    info!("Running preflight checks");

    let checks = vec![
        check_api_key(&config.api_key),
        check_binary(OCR_CHECK, TESSERACT_BINARY, "tesseract-ocr"),
        check_binary(PDF_RASTER_CHECK, PDFTOPPM_BINARY, "poppler-utils"),
        check_binary(TRANSCRIPTION_CHECK, WHISPER_BINARY, "openai-whisper"),
    ];
    let report = PreflightReport::from_checks(checks);

    for check in &report.checks {
        if check.passed {
            info!("  ✅ {}: {}", check.name, check.message);
        } else {
            warn!("  ❌ {}: {}", check.name, check.message);
            if let Some(details) = &check.details {
                warn!("      Details: {}", details);
            }
        }
    }
    info!("Summary: {}", report.summary);

    report
}

fn check_api_key(api_key: &str) -> CheckResult {
    if api_key.trim().is_empty() {
        return CheckResult::fail(API_KEY_CHECK, "API key is empty", None);
    }
    if !api_key.starts_with("sk-ant-") {
        return CheckResult::pass(
            API_KEY_CHECK,
            "API key present",
            Some("Key does not use the usual sk-ant- prefix".to_string()),
        );
    }
    CheckResult::pass(API_KEY_CHECK, "API key present", None)
}

fn check_binary(name: &str, binary: &str, package: &str) -> CheckResult {
    match which::which(binary) {
        Ok(path) => CheckResult::pass(name, &format!("{} found", binary), Some(path.display().to_string())),
        Err(e) => CheckResult::fail(
            name,
            &format!("{} not found. Install {}", binary, package),
            Some(e.to_string()),
        ),
    }
}
