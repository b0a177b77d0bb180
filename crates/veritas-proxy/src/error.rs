//! Proxy error types and their client-facing shape.

use serde_json::{json, Value};
use thiserror::Error;

use crate::gateway::ProxyResponse;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request payload failed a format check. Raised before any upstream call.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Network(String),

    #[error("{provider} API returned {status}")]
    UpstreamStatus { provider: &'static str, status: u16 },

    #[error("request timed out after {0}ms")]
    Timeout(u128),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Internal(String),
}

impl ProxyError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Error body for routes that report a bare `{error}` or `{error, endpoint}`.
    pub fn into_response(self, endpoint: Option<&str>) -> ProxyResponse {
        match self {
            Self::Validation(message) => ProxyResponse::new(400, json!({ "error": message })),
            other => {
                let mut body = json!({ "error": other.to_string() });
                if let (Some(endpoint), Value::Object(map)) = (endpoint, &mut body) {
                    map.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
                }
                ProxyResponse::new(500, body)
            }
        }
    }

    /// Error body for the chat route: anything past validation is reported as a
    /// generic internal error carrying the detail in `message`.
    pub fn into_internal_response(self) -> ProxyResponse {
        if self.is_validation() {
            return self.into_response(None);
        }
        ProxyResponse::new(
            500,
            json!({
                "error": "Internal server error",
                "message": self.to_string(),
            }),
        )
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ProxyError::InvalidResponse(e.to_string())
        } else {
            ProxyError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        ProxyError::InvalidResponse(e.to_string())
    }
}
