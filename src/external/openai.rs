use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SummarizerConfig;
use crate::external::error::SummarizerError;
use crate::external::summarizer::{
    parse_summary, truncate_input, user_prompt, with_retry, RetryPolicy, Summarizer, Summary,
    SYSTEM_PROMPT,
};

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

/// Summarizer backed by the OpenAI chat completions API in JSON mode.
pub struct OpenAiSummarizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_input_chars: usize,
    retry: RetryPolicy,
}

impl OpenAiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            SummarizerError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY.".to_string(),
            )
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.get_url()?,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
            retry: config.retry_policy(),
        })
    }

    async fn request_summary(&self, text: &str) -> Result<Summary, SummarizerError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": &self.model,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt(text) }
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SummarizerError::from_status(status, message));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| SummarizerError::MalformedResponse(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SummarizerError::MalformedResponse("no choices returned".to_string()))?;

        parse_summary(&content)
    }
}

pub(crate) fn map_request_error(e: reqwest::Error) -> SummarizerError {
    if e.is_timeout() {
        SummarizerError::Timeout(e.to_string())
    } else {
        SummarizerError::Request(e)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary, SummarizerError> {
        let (input, _) = truncate_input(text, self.max_input_chars);
        debug!("Requesting summary from {} ({} chars)", self.model, input.len());
        with_retry(self.retry, || self.request_summary(&input)).await
    }
}
