use serde::Deserialize;
use thiserror::Error;

/// `error.errors[].reason` values Drive uses for quota and rate limiting.
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
    "quotaExceeded",
    "sharingRateLimitExceeded",
];

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Drive API error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Pagination error: {0}")]
    Pagination(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

impl DriveError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::AccessDenied(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            _ => Self::Http { status, message },
        }
    }

    /// Maps a failed response using the reason codes in its JSON body, so a
    /// quota 403 is not mistaken for a permission denial.
    pub fn from_response(status: u16, body: String) -> Self {
        let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) else {
            return Self::from_status(status, body);
        };

        let rate_limited = parsed
            .error
            .errors
            .iter()
            .any(|e| RATE_LIMIT_REASONS.contains(&e.reason.as_str()));
        let message = if parsed.error.message.is_empty() {
            body
        } else {
            parsed.error.message
        };

        if rate_limited {
            Self::RateLimited(message)
        } else {
            Self::from_status(status, message)
        }
    }

    /// Errors that only cost the walker one branch of the tree.
    pub fn is_branch_local(&self) -> bool {
        matches!(self, Self::AccessDenied(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            DriveError::from_status(401, String::new()),
            DriveError::Unauthorized(_)
        ));
        assert!(DriveError::from_status(403, String::new()).is_branch_local());
        assert!(DriveError::from_status(404, String::new()).is_branch_local());
        assert!(!DriveError::from_status(500, String::new()).is_branch_local());
        assert!(!DriveError::from_status(401, String::new()).is_branch_local());
        assert!(!DriveError::from_status(429, String::new()).is_branch_local());
    }

    fn body(reason: &str, message: &str) -> String {
        serde_json::json!({
            "error": {
                "code": 403,
                "message": message,
                "errors": [{ "domain": "usageLimits", "reason": reason, "message": message }]
            }
        })
        .to_string()
    }

    #[test]
    fn test_rate_limit_403_is_not_branch_local() {
        for reason in ["rateLimitExceeded", "userRateLimitExceeded", "dailyLimitExceeded"] {
            let err = DriveError::from_response(403, body(reason, "Slow down"));
            assert!(matches!(err, DriveError::RateLimited(ref m) if m == "Slow down"), "{}: {:?}", reason, err);
            assert!(!err.is_branch_local());
        }
    }

    #[test]
    fn test_permission_403_is_access_denied() {
        let err = DriveError::from_response(403, body("insufficientFilePermissions", "No access"));
        assert!(matches!(err, DriveError::AccessDenied(ref m) if m == "No access"));
        assert!(err.is_branch_local());

        let err = DriveError::from_response(404, body("notFound", "File not found: abc"));
        assert!(matches!(err, DriveError::NotFound(_)));
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        let err = DriveError::from_response(403, "<html>Forbidden</html>".to_string());
        assert!(matches!(err, DriveError::AccessDenied(ref m) if m.contains("Forbidden")));

        let err = DriveError::from_response(503, String::new());
        assert!(matches!(err, DriveError::Http { status: 503, .. }));
    }
}
