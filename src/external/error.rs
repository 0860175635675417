use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Summarization service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

impl SummarizerError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => Self::RateLimited(message),
            408 => Self::Timeout(message),
            _ => Self::Service { status, message },
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Timeout(_) | Self::MalformedResponse(_) => true,
            Self::Service { status, .. } => *status >= 500,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SummarizerError::from_status(429, String::new()).is_retryable());
        assert!(SummarizerError::from_status(503, String::new()).is_retryable());
        assert!(SummarizerError::MalformedResponse(String::new()).is_retryable());
        assert!(!SummarizerError::from_status(400, String::new()).is_retryable());
        assert!(!SummarizerError::from_status(401, String::new()).is_retryable());
        assert!(!SummarizerError::Config(String::new()).is_retryable());
    }
}
