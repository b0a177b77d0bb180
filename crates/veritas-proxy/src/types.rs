//! Wire types.
//!
//! The chat route accepts a camelCase body from the browser client and
//! re-serializes the relevant parts as an Anthropic `/v1/messages` request.
//! `system`, `messages` and `maxTokens` are kept as raw JSON so they reach the
//! upstream exactly as supplied; Anthropic rejects malformed values itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `max_tokens` sent upstream when the caller omits `maxTokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Model used for every chat request.
pub const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Body of `POST /api/claude`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeProxyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub system: Option<Value>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
}

/// Request body for Anthropic's `/v1/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl MessagesRequest {
    pub fn from_proxy_request(req: ClaudeProxyRequest) -> Self {
        Self {
            model: CLAUDE_MODEL.to_string(),
            max_tokens: req
                .max_tokens
                .filter(|v| !is_falsy(v))
                .unwrap_or_else(|| Value::from(DEFAULT_MAX_TOKENS)),
            system: req.system,
            messages: req.messages,
        }
    }
}

/// `null`, `false`, `0` and `""` count as "not supplied".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proxy_request_uses_camel_case() {
        let req: ClaudeProxyRequest = serde_json::from_value(json!({
            "apiKey": "sk-ant-abc",
            "system": "be brief",
            "messages": [{"role": "user", "content": "hi"}],
            "maxTokens": 256
        }))
        .unwrap();

        assert_eq!(req.api_key.as_deref(), Some("sk-ant-abc"));
        assert_eq!(req.max_tokens, Some(json!(256)));
        assert_eq!(req.system, Some(json!("be brief")));
    }

    #[test]
    fn test_max_tokens_defaults_when_missing_or_zero() {
        let out = MessagesRequest::from_proxy_request(ClaudeProxyRequest::default());
        assert_eq!(out.max_tokens, json!(DEFAULT_MAX_TOKENS));
        assert_eq!(out.model, CLAUDE_MODEL);

        for empty in [json!(0), json!(null), json!(false), json!("")] {
            let out = MessagesRequest::from_proxy_request(ClaudeProxyRequest {
                max_tokens: Some(empty),
                ..Default::default()
            });
            assert_eq!(out.max_tokens, json!(DEFAULT_MAX_TOKENS));
        }
    }

    #[test]
    fn test_non_numeric_max_tokens_passes_through() {
        let req: ClaudeProxyRequest =
            serde_json::from_value(json!({ "apiKey": "sk-ant-x", "maxTokens": "500" })).unwrap();
        let out = MessagesRequest::from_proxy_request(req);
        assert_eq!(out.max_tokens, json!("500"));
    }

    #[test]
    fn test_messages_request_omits_absent_system() {
        let out = MessagesRequest::from_proxy_request(ClaudeProxyRequest {
            messages: Some(json!([])),
            ..Default::default()
        });
        let v = serde_json::to_value(&out).unwrap();
        assert!(v.get("system").is_none());
        assert_eq!(v["messages"], json!([]));
    }
}
