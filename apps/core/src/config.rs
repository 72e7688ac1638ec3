use crate::actors::llm::LlmSettings;
use crate::error::AppError;
use crate::logging::LogFormat;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

// --- Defaults ---
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_API_URL: &str = "https://api.anthropic.com";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TRANSCRIPT_LANGUAGE: &str = "en";

/// Runtime settings, read once at startup.
#[derive(Clone, Validate)]
pub struct ServiceConfig {
    #[validate(length(min = 1, message = "ANTHROPIC_API_KEY must not be empty"))]
    pub api_key: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub api_url: Url,
    pub host: String,
    pub port: u16,
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,
    #[validate(range(min = 1, max = 600))]
    pub llm_timeout_secs: u64,
    #[validate(length(min = 2, max = 8))]
    pub transcript_language: String,
    /// Prefix transcript lines with `[MM:SS]`.
    pub transcript_timestamps: bool,
    pub log_format: LogFormat,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url.as_str())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("transcript_language", &self.transcript_language)
            .field("transcript_timestamps", &self.transcript_timestamps)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ServiceConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AppError::Config("ANTHROPIC_API_KEY environment variable not set".to_string()))?;

        let config = Self {
            api_key: api_key.trim().to_string(),
            model: var_or("ANTHROPIC_MODEL", DEFAULT_MODEL),
            api_url: Url::parse(&var_or("ANTHROPIC_API_URL", DEFAULT_API_URL))?,
            host: var_or("SERVER_HOST", DEFAULT_HOST),
            port: parse_var("SERVER_PORT", DEFAULT_PORT)?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?,
            transcript_language: var_or("TRANSCRIPT_LANGUAGE", DEFAULT_TRANSCRIPT_LANGUAGE),
            transcript_timestamps: parse_var("TRANSCRIPT_TIMESTAMPS", false)?,
            log_format: parse_var("LOG_FORMAT", LogFormat::default())?,
        };

        config
            .validate()
            .map_err(|e| AppError::Config(format!("Invalid configuration: {}", e)))?;
        Ok(config)
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.api_url.as_str().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}
