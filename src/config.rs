use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::external::{RetryPolicy, SummarizerError};

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub api_base: String,
    pub root_folder_id: Option<String>,
    pub access_token: Option<String>,
    pub service_account_key_path: Option<String>,
    pub service_account_json: Option<String>,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    OpenAi,
    Ollama,
}

impl FromStr for SummarizerProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Unknown summarizer provider: {}", other)),
        }
    }
}

impl SummarizerProvider {
    /// Default endpoint and model for the provider.
    pub fn defaults(self) -> (&'static str, &'static str) {
        match self {
            Self::OpenAi => (DEFAULT_OPENAI_ENDPOINT, "gpt-4o"),
            Self::Ollama => (DEFAULT_OLLAMA_ENDPOINT, "mistral"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub provider: SummarizerProvider,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Characters of document text sent to the model.
    pub max_input_chars: usize,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl SummarizerConfig {
    /// Get the full base URL for the summarization service
    pub fn get_url(&self) -> Result<String, SummarizerError> {
        let endpoint = self.endpoint.trim_end_matches('/');
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        Url::parse(&url).map_err(|e| SummarizerError::Config(format!("Invalid URL: {}", e)))?;

        Ok(url)
    }

    /// Switches provider, resetting endpoint and model unless set explicitly
    /// in the environment.
    pub fn set_provider(&mut self, provider: SummarizerProvider) {
        if provider == self.provider {
            return;
        }
        self.provider = provider;
        let (endpoint, model) = provider.defaults();
        if non_empty("SUMMARIZER_ENDPOINT").is_none() {
            self.endpoint = endpoint.to_string();
        }
        if non_empty("SUMMARIZER_MODEL").is_none() {
            self.model = model.to_string();
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub max_concurrent_documents: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub drive: DriveConfig,
    pub summarizer: SummarizerConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let drive = DriveConfig {
            api_base: env::var("DRIVE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_DRIVE_API_BASE.to_string()),
            root_folder_id: non_empty("DRIVE_FOLDER_ID"),
            access_token: non_empty("GOOGLE_ACCESS_TOKEN"),
            service_account_key_path: non_empty("GOOGLE_SERVICE_ACCOUNT_KEY"),
            service_account_json: non_empty("GOOGLE_SERVICE_ACCOUNT_JSON"),
            page_size: parse_or("DRIVE_PAGE_SIZE", 1000),
        };
        Url::parse(&drive.api_base)
            .map_err(|e| anyhow!("Invalid DRIVE_API_BASE {}: {}", drive.api_base, e))?;

        let provider = match non_empty("SUMMARIZER_PROVIDER") {
            Some(value) => value.parse()?,
            None => SummarizerProvider::OpenAi,
        };
        let (default_endpoint, default_model) = provider.defaults();

        let summarizer = SummarizerConfig {
            provider,
            api_key: non_empty("OPENAI_API_KEY"),
            endpoint: env::var("SUMMARIZER_ENDPOINT")
                .unwrap_or_else(|_| default_endpoint.to_string()),
            model: env::var("SUMMARIZER_MODEL").unwrap_or_else(|_| default_model.to_string()),
            temperature: parse_or("SUMMARIZER_TEMPERATURE", 0.3),
            max_tokens: parse_or("SUMMARIZER_MAX_TOKENS", 1000),
            max_input_chars: parse_or("SUMMARIZER_MAX_INPUT_CHARS", 32_000),
            max_attempts: parse_or("SUMMARIZER_MAX_ATTEMPTS", 3),
            initial_backoff_ms: parse_or("SUMMARIZER_INITIAL_BACKOFF_MS", 1000),
            timeout_secs: parse_or("SUMMARIZER_TIMEOUT_SECS", 60),
        };

        let processing = ProcessingConfig {
            max_concurrent_documents: parse_or("MAX_CONCURRENT_DOCUMENTS", 4usize).max(1),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let output = OutputConfig {
            output_path: env::var("OUTPUT_PATH")
                .unwrap_or_else(|_| "knowledge_base.md".to_string()),
            title: env::var("KNOWLEDGE_BASE_TITLE")
                .unwrap_or_else(|_| "Google Drive Knowledge Base".to_string()),
        };

        Ok(Self {
            drive,
            summarizer,
            processing,
            output,
        })
    }
}
