pub mod error;
mod ollama;
mod openai;
pub mod summarizer;

use std::sync::Arc;

use crate::config::{SummarizerConfig, SummarizerProvider};

pub use error::SummarizerError;
pub use ollama::OllamaSummarizer;
pub use openai::OpenAiSummarizer;
pub use summarizer::{RetryPolicy, Summarizer, Summary};

/// Builds the summarizer selected by the configuration.
pub fn summarizer_from_config(
    config: &SummarizerConfig,
) -> Result<Arc<dyn Summarizer>, SummarizerError> {
    match config.provider {
        SummarizerProvider::OpenAi => Ok(Arc::new(OpenAiSummarizer::new(config)?)),
        SummarizerProvider::Ollama => Ok(Arc::new(OllamaSummarizer::new(config)?)),
    }
}
