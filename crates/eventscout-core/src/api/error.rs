use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Rate limited (429): {0}")]
    RateLimited(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed - the proxy only accepts POST")]
    MethodNotAllowed,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body the proxy returns alongside 4xx/5xx statuses
#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

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

    /// Prefer the proxy's `message`, then `error`, then the raw body.
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ProxyErrorBody>(body) {
            Ok(ProxyErrorBody { message: Some(m), .. }) if !m.is_empty() => Self::truncate_body(&m),
            Ok(ProxyErrorBody { error: Some(e), .. }) if !e.is_empty() => Self::truncate_body(&e),
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::describe_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(detail),
            405 => ApiError::MethodNotAllowed,
            429 => ApiError::RateLimited(detail),
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// Rate limiting is detected by status or, for errors that lost their
    /// status along the way, by a "429" in the message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::RateLimited(_) => true,
            ApiError::NetworkError(e) if e.status().map(|s| s.as_u16()) == Some(429) => true,
            other => other.to_string().contains("429"),
        }
    }
}
