use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode {context}: {source}")]
    Decoding {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Token refresh failed: {0}")]
    AuthRefresh(String),

    #[error("Refresh token rejected - session expired")]
    AuthExpired,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential storage error: {0:#}")]
    Storage(#[source] anyhow::Error),
}

/// Result alias used by every network-facing operation.
pub type ApiResult<T> = Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn decoding(context: impl Into<String>, source: serde_json::Error) -> Self {
        ApiError::Decoding {
            context: context.into(),
            source,
        }
    }

    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(err)
    }

    /// True when the backend answered 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
