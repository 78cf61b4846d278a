//! Errors returned by the backend client.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of characters of a response body kept in an error.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Response body text (truncated).
        body: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint could not be joined onto the base URL.
    #[error("Invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        /// Endpoint as given by the caller.
        endpoint: String,
        /// Underlying URL error.
        source: url::ParseError,
    },

    /// The response body was not what the caller expected.
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    /// A form field could not be encoded (e.g. invalid MIME type).
    #[error("Invalid form field {field}: {reason}")]
    InvalidForm {
        /// Field name.
        field: String,
        /// Why the field was rejected.
        reason: String,
    },

    /// Reading or writing the token store failed.
    #[error("Token storage error: {0}")]
    TokenStorage(String),

    /// The operation needs a logged-in user but no tokens are stored.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// Build a status error, truncating the body.
    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    /// HTTP status returned by the backend, if this is a status error.
    #[must_use]
    pub const fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }

    /// Whether the backend rejected the credentials or token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status_code(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        ) || matches!(self, Self::NotAuthenticated)
    }

    /// Whether the backend rejected the submitted data.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.status_code() == Some(StatusCode::BAD_REQUEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_embeds_code_and_body() {
        let err = ApiError::status(StatusCode::BAD_GATEWAY, "upstream down");
        let message = err.to_string();
        assert!(message.contains("502"));
        assert!(message.contains("upstream down"));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(2_000);
        let err = ApiError::status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let ApiError::Status { body, .. } = err else {
            unreachable!("status() always builds a Status error");
        };
        assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(ApiError::status(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(ApiError::status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(ApiError::NotAuthenticated.is_unauthorized());
        assert!(ApiError::status(StatusCode::BAD_REQUEST, "{}").is_validation());
        assert!(!ApiError::UnexpectedBody("empty".into()).is_not_found());
    }
}
