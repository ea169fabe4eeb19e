//! Errors from the campaign backend client.

/// Longest response-body excerpt carried in an error message.
pub const BODY_SNIPPET_LIMIT: usize = 400;

/// Errors from the REST client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The backend's `error` field, or a `Request failed (..)` line with
        /// a body excerpt.
        message: String,
    },

    /// The backend rejected the credentials (HTTP 401).
    #[error("Authentication required")]
    Unauthorized,

    /// A success response whose body could not be read as the expected JSON.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration could not be turned into a working client.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status of the failure, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidResponse(_) | Self::Config(_) => None,
        }
    }
}

/// First [`BODY_SNIPPET_LIMIT`] characters of a body with whitespace runs
/// collapsed to single spaces.
pub fn body_snippet(body: &str) -> String {
    let head: String = body.chars().take(BODY_SNIPPET_LIMIT).collect();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the [`ClientError`] for a non-2xx response body.
pub(crate) fn api_error(status: u16, body: &str) -> ClientError {
    if status == 401 {
        return ClientError::Unauthorized;
    }

    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty());

    let message = match from_json {
        Some(message) => message,
        None => {
            let snippet = body_snippet(body);
            if snippet.is_empty() {
                format!("Request failed ({status})")
            } else {
                format!("Request failed ({status}): {snippet}")
            }
        }
    };

    ClientError::Api { status, message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
