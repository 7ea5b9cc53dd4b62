//! Plan generation pipeline: prompt, one generator call, extraction.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::generator::{DEFAULT_MODEL, Generator, envelope_text};
use crate::plan::{build_prompt, extract_plan};
use crate::profile::UserProfile;

/// Diagnostic payload for a failed generation: a message plus the best raw
/// text available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct GenerationError {
    pub error: String,
    pub raw: String,
}

/// Generates workout plans through a [`Generator`].
///
/// One outbound call per [`PlanGenerator::generate`]; failures are returned
/// immediately, never retried.
#[derive(Clone)]
pub struct PlanGenerator {
    generator: Arc<dyn Generator>,
    model: String,
}

impl PlanGenerator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_model(generator, DEFAULT_MODEL)
    }

    pub fn with_model(generator: Arc<dyn Generator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a plan for `profile`.
    pub async fn generate(&self, profile: &UserProfile) -> Result<Value, GenerationError> {
        let prompt = build_prompt(profile);

        let envelope = self
            .generator
            .generate_content(&self.model, &prompt)
            .await
            .map_err(|e| {
                warn!(generator = self.generator.name(), error = %e, "generator call failed");
                GenerationError {
                    error: format!("generator request failed: {e}"),
                    raw: e.raw().to_owned(),
                }
            })?;

        let Some(text) = envelope_text(&envelope) else {
            warn!(generator = self.generator.name(), "no text in generator response");
            return Err(GenerationError {
                error: "could not find text in response".to_owned(),
                raw: envelope.to_string(),
            });
        };

        match extract_plan(text) {
            Ok(plan) => {
                info!(model = %self.model, "plan generated");
                Ok(plan)
            }
            Err(failure) => {
                warn!(reason = %failure.reason, "generated text is not valid JSON");
                Err(GenerationError {
                    error: failure.to_string(),
                    raw: failure.raw,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::generator::GeneratorError;

    /// Returns a canned envelope and records every call.
    struct ScriptedGenerator {
        reply: Result<Value, u16>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGenerator {
        fn replying(reply: Value) -> Self {
            Self {
                reply: Ok(reply),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_content(
            &self,
            model: &str,
            prompt: &str,
        ) -> Result<Value, GeneratorError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_owned(), prompt.to_owned()));
            match &self.reply {
                Ok(envelope) => Ok(envelope.clone()),
                Err(status) => Err(GeneratorError::Api {
                    status: *status,
                    body: "upstream said no".to_owned(),
                }),
            }
        }
    }

    fn text_envelope(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[tokio::test]
    async fn fenced_reply_becomes_plan() {
        let generator = Arc::new(ScriptedGenerator::replying(text_envelope(
            "```json\n{\"days\": [{\"day-number\": 1, \"workouts\": []}]}\n```",
        )));
        let planner = PlanGenerator::new(generator.clone());

        let profile = UserProfile {
            days: Some(1),
            ..UserProfile::default()
        };
        let plan = planner.generate(&profile).await.unwrap();
        assert_eq!(plan["days"][0]["day-number"], 1);

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "exactly one outbound call");
        assert_eq!(calls[0].0, DEFAULT_MODEL);
        assert_eq!(calls[0].1, build_prompt(&profile));
    }

    #[tokio::test]
    async fn custom_model_is_forwarded() {
        let generator = Arc::new(ScriptedGenerator::replying(text_envelope("{}")));
        let planner = PlanGenerator::with_model(generator.clone(), "gemini-test");
        planner.generate(&UserProfile::default()).await.unwrap();
        assert_eq!(generator.calls.lock().unwrap()[0].0, "gemini-test");
        assert_eq!(planner.model(), "gemini-test");
    }

    #[tokio::test]
    async fn missing_text_reports_envelope() {
        let envelope = json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}});
        let planner = PlanGenerator::new(Arc::new(ScriptedGenerator::replying(envelope.clone())));

        let err = planner.generate(&UserProfile::default()).await.unwrap_err();
        assert_eq!(err.error, "could not find text in response");
        assert_eq!(err.raw, envelope.to_string());
    }

    #[tokio::test]
    async fn unparseable_text_reports_cleaned_text() {
        let planner = PlanGenerator::new(Arc::new(ScriptedGenerator::replying(text_envelope(
            "```json\nnot json at all\n```",
        ))));

        let err = planner.generate(&UserProfile::default()).await.unwrap_err();
        assert!(err.error.starts_with("could not parse response: "), "{}", err.error);
        assert_eq!(err.raw, "not json at all");
    }

    #[tokio::test]
    async fn failed_call_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::failing(503));
        let planner = PlanGenerator::new(generator.clone());

        let err = planner.generate(&UserProfile::default()).await.unwrap_err();
        assert!(err.error.starts_with("generator request failed"));
        assert_eq!(err.raw, "upstream said no");
        assert_eq!(generator.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn generation_error_serializes_as_payload() {
        let err = GenerationError {
            error: "could not find text in response".into(),
            raw: "{}".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "could not find text in response", "raw": "{}"})
        );
    }
}
