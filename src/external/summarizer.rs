use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::external::error::SummarizerError;

pub const TRUNCATION_NOTE: &str = "\n\n[Content truncated due to length]";

pub const SYSTEM_PROMPT: &str = "You are an expert summarizer and knowledge extractor. Your task is to:\n\
1. Create a concise summary (3-5 sentences) of the key points in the document\n\
2. Extract 3-7 key concepts/ideas from the document\n\
3. Format your response in JSON with two fields: 'summary' and 'key_concepts' (an array of strings)\n\n\
Focus on the most important and unique ideas in the text. Ignore routine or boilerplate content.";

/// Summary and key concepts for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<Summary, SummarizerError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling from the initial backoff.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error or
/// `max_attempts` is reached.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, SummarizerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SummarizerError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    "Summarization attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Keeps the first `max_chars` characters of `text`, appending a truncation
/// note when anything was cut.
pub fn truncate_input(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!(
                "Content truncated from {} to {} characters",
                text.chars().count(),
                max_chars
            );
            let mut truncated = text[..cut].to_string();
            truncated.push_str(TRUNCATION_NOTE);
            (truncated, true)
        }
        None => (text.to_string(), false),
    }
}

pub fn user_prompt(text: &str) -> String {
    format!(
        "Please summarize this document and extract its key concepts:\n\n{}",
        text
    )
}

/// Parses the model's JSON reply, tolerating a surrounding code fence.
pub fn parse_summary(content: &str) -> Result<Summary, SummarizerError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|inner| inner.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let summary: Summary = serde_json::from_str(json)
        .map_err(|e| SummarizerError::MalformedResponse(format!("{}: {}", e, json)))?;

    if summary.summary.trim().is_empty() {
        return Err(SummarizerError::MalformedResponse(
            "empty summary field".to_string(),
        ));
    }
    Ok(summary)
}
