//! Request/response shapes of the hosted chat-completion APIs we can narrate with.

use enum_dispatch::enum_dispatch;
use serde_json::{json, Value};

#[enum_dispatch]
pub trait ChatDialect {
    /// Endpoint path for chat completions (default: OpenAI-style)
    fn chat_endpoint(&self) -> &'static str {
        "/v1/chat/completions"
    }

    /// Authentication and versioning headers (default: Bearer token)
    fn chat_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![("authorization", format!("Bearer {api_key}"))]
    }

    /// Build the request body for a single-turn completion (default: OpenAI-style)
    fn build_chat_body(&self, model_id: &str, prompt: &str, max_tokens: u32) -> Value {
        json!({
            "model": model_id,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        })
    }

    /// Parse the assistant's text from the response (default: OpenAI-style)
    fn parse_chat_content<'a>(&self, response: &'a Value) -> Option<&'a str> {
        response["choices"][0]["message"]["content"].as_str()
    }
}

/// OpenAI and every API compatible with its chat-completions shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenAi;

impl ChatDialect for OpenAi {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anthropic;

impl Anthropic {
    const API_VERSION: &'static str = "2023-06-01";
}

impl ChatDialect for Anthropic {
    fn chat_endpoint(&self) -> &'static str {
        "/v1/messages"
    }

    fn chat_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", Self::API_VERSION.to_string()),
        ]
    }

    fn build_chat_body(&self, model_id: &str, prompt: &str, max_tokens: u32) -> Value {
        json!({
            "model": model_id,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        })
    }

    fn parse_chat_content<'a>(&self, response: &'a Value) -> Option<&'a str> {
        response["content"][0]["text"].as_str()
    }
}

#[enum_dispatch(ChatDialect)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenAi,
    Anthropic,
}

impl Default for Dialect {
    fn default() -> Self {
        OpenAi.into()
    }
}

impl Dialect {
    /// Detect the dialect from the API base URL.
    pub fn from_api_url(url: &str) -> Self {
        if url.contains("anthropic") {
            Anthropic.into()
        } else {
            OpenAi.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_url() {
        assert_eq!(Dialect::from_api_url("https://api.openai.com"), Dialect::OpenAi(OpenAi));
        assert_eq!(
            Dialect::from_api_url("https://api.anthropic.com"),
            Dialect::Anthropic(Anthropic)
        );
        assert_eq!(Dialect::from_api_url("http://127.0.0.1:9000"), Dialect::default());
    }

    #[test]
    fn test_openai_shapes() {
        let dialect = Dialect::default();
        let body = dialect.build_chat_body("gpt-4o-mini", "hi", 64);
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["max_tokens"], 64);

        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]});
        assert_eq!(dialect.parse_chat_content(&reply), Some("Hello"));
        assert_eq!(dialect.chat_headers("k")[0].1, "Bearer k");
    }

    #[test]
    fn test_anthropic_shapes() {
        let dialect = Dialect::from_api_url("https://api.anthropic.com");
        assert_eq!(dialect.chat_endpoint(), "/v1/messages");

        let reply = json!({"content": [{"type": "text", "text": "Hello"}]});
        assert_eq!(dialect.parse_chat_content(&reply), Some("Hello"));
        assert_eq!(
            dialect.parse_chat_content(&json!({"choices": []})),
            None
        );
    }
}
