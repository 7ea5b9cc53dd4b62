//! The `Generator` trait -- the adapter interface for generative text APIs.
//!
//! The planner only needs one call: send a prompt to a model and get back
//! the provider's response envelope. Reading generated text out of that
//! envelope is done by [`envelope_text`], which tolerates unexpected shapes.

pub mod gemini;

use async_trait::async_trait;
use serde_json::Value;

pub use gemini::{GeminiClient, GeminiConfig};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Failures of the outbound generator call itself.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status; `body` is kept for diagnosis.
    #[error("API error (HTTP {status})")]
    Api { status: u16, body: String },

    #[error("response is not JSON: {reason}")]
    InvalidEnvelope { reason: String, body: String },
}

impl GeneratorError {
    /// Best raw text available for this failure.
    pub fn raw(&self) -> &str {
        match self {
            Self::Request(_) => "",
            Self::Api { body, .. } | Self::InvalidEnvelope { body, .. } => body,
        }
    }
}

/// Adapter for a generative text API.
///
/// Object-safe so it can be shared as `Arc<dyn Generator>`.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt` as the sole content to `model` and return the raw
    /// response envelope.
    async fn generate_content(&self, model: &str, prompt: &str) -> Result<Value, GeneratorError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};

/// Generated text at `candidates[0].content.parts[0].text`, if present.
pub fn envelope_text(envelope: &Value) -> Option<&str> {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_text_reads_first_part() {
        let envelope = json!({
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}], "role": "model"}},
                {"content": {"parts": [{"text": "other candidate"}]}}
            ]
        });
        assert_eq!(envelope_text(&envelope), Some("first"));
    }

    #[test]
    fn envelope_text_tolerates_missing_path() {
        assert_eq!(envelope_text(&json!({})), None);
        assert_eq!(envelope_text(&json!({"candidates": []})), None);
        assert_eq!(
            envelope_text(&json!({"candidates": [{"content": {"parts": []}}]})),
            None
        );
        assert_eq!(
            envelope_text(&json!({"candidates": [{"content": {"parts": [{"text": 7}]}}]})),
            None
        );
    }

    #[test]
    fn generator_error_raw_text() {
        let api = GeneratorError::Api {
            status: 429,
            body: "quota".into(),
        };
        assert_eq!(api.raw(), "quota");
        assert_eq!(api.to_string(), "API error (HTTP 429)");
        assert_eq!(GeneratorError::Request("timeout".into()).raw(), "");
    }
}
