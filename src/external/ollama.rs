use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SummarizerConfig;
use crate::external::error::SummarizerError;
use crate::external::openai::map_request_error;
use crate::external::summarizer::{
    parse_summary, truncate_input, user_prompt, with_retry, RetryPolicy, Summarizer, Summary,
    SYSTEM_PROMPT,
};

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Summarizer backed by a local Ollama server's chat endpoint, with the reply
/// constrained by a JSON schema.
pub struct OllamaSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_input_chars: usize,
    retry: RetryPolicy,
}

impl OllamaSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.get_url()?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
            retry: config.retry_policy(),
        })
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": &self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(text) }
            ],
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens
            },
            "format": {
                "type": "object",
                "required": ["summary", "key_concepts"],
                "properties": {
                    "summary": { "type": "string" },
                    "key_concepts": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }
        })
    }

    async fn request_summary(&self, text: &str) -> Result<Summary, SummarizerError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SummarizerError::from_status(status, message));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::MalformedResponse(e.to_string()))?;
        parse_summary(&chat.message.content)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary, SummarizerError> {
        let (input, _) = truncate_input(text, self.max_input_chars);
        debug!("Requesting summary from Ollama {} ({} chars)", self.model, input.len());
        with_retry(self.retry, || self.request_summary(&input)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummarizerProvider;

    #[test]
    fn test_request_body_schema() {
        let config = SummarizerConfig {
            provider: SummarizerProvider::Ollama,
            api_key: None,
            endpoint: "localhost:11434".to_string(),
            model: "mistral".to_string(),
            temperature: 0.3,
            max_tokens: 750,
            max_input_chars: 100,
            max_attempts: 2,
            initial_backoff_ms: 0,
            timeout_secs: 5,
        };
        let summarizer = OllamaSummarizer::new(&config).unwrap();
        assert_eq!(summarizer.endpoint, "http://localhost:11434");

        let body = summarizer.request_body("text");
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "mistral");
        assert_eq!(body["format"]["required"][0], "summary");
        assert_eq!(body["options"]["num_predict"], 750);
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("text"));
    }
}
