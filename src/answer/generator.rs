//! Core `AnswerGenerator` trait and `ApiAnswerGenerator` implementation.
//!
//! `ApiAnswerGenerator` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint — Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM, etc.
//! All connection details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = "You are a concise meeting assistant. Answer the \
question the other party just asked, in a few short sentences the user can \
deliver verbally. No preamble, no markdown.";

// ---------------------------------------------------------------------------
// AnswerError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating an answer.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("answer request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse answer response: {0}")]
    Parse(String),

    /// The generator returned a response with no usable text content.
    #[error("generator returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for AnswerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnswerError::Timeout
        } else {
            AnswerError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AnswerGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for the answer-generation collaborator.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn AnswerGenerator>`).  The engine itself never
/// calls this directly; the host wires [`crate::engine::EngineOutput::DispatchRequested`]
/// to a spawned task running `generate`, and feeds the result back as an
/// `AnswerCompleted`/`AnswerFailed` event.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> Result<String, AnswerError>;
}

// ---------------------------------------------------------------------------
// ApiAnswerGenerator
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with: Ollama (OpenAI mode), OpenAI, Groq, Together.ai, LM Studio,
/// vLLM — any provider that speaks the OpenAI chat-completions wire format.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `model`) come exclusively
/// from the [`LlmConfig`] passed to [`ApiAnswerGenerator::from_config`].
pub struct ApiAnswerGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiAnswerGenerator {
    /// Build an `ApiAnswerGenerator` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl AnswerGenerator for ApiAnswerGenerator {
    /// Send `question` to the configured OpenAI-compatible endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// Ollama and other local providers that require no authentication.
    async fn generate(&self, question: &str) -> Result<String, AnswerError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user",   "content": question      }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  512
        });

        let mut req = self.client.post(&url).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnswerError::Parse(e.to_string()))?;

        let answer = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(AnswerError::EmptyResponse)?
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(AnswerError::EmptyResponse);
        }

        Ok(answer)
    }
}

// ---------------------------------------------------------------------------
// MockAnswerGenerator  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without any network.
#[cfg(test)]
pub struct MockAnswerGenerator {
    response: Result<String, AnswerError>,
}

#[cfg(test)]
impl MockAnswerGenerator {
    /// A mock that always succeeds with `answer`.
    pub fn ok(answer: &str) -> Self {
        Self {
            response: Ok(answer.to_string()),
        }
    }

    /// A mock that always fails with a timeout.
    pub fn failing() -> Self {
        Self {
            response: Err(AnswerError::Timeout),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AnswerGenerator for MockAnswerGenerator {
    async fn generate(&self, _question: &str) -> Result<String, AnswerError> {
        match &self.response {
            Ok(answer) => Ok(answer.clone()),
            Err(AnswerError::Timeout) => Err(AnswerError::Timeout),
            Err(e) => Err(AnswerError::Request(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let config = make_config(None);
        let _generator = ApiAnswerGenerator::from_config(&config);
    }

    #[test]
    fn from_config_accepts_empty_api_key() {
        let config = make_config(Some(""));
        let _generator = ApiAnswerGenerator::from_config(&config);
    }

    #[test]
    fn from_config_accepts_real_api_key() {
        let config = make_config(Some("sk-test-1234"));
        let _generator = ApiAnswerGenerator::from_config(&config);
    }

    /// Verify that the trait is object-safe (usable as `dyn AnswerGenerator`).
    #[test]
    fn generator_is_object_safe() {
        let config = make_config(None);
        let generator: Box<dyn AnswerGenerator> =
            Box::new(ApiAnswerGenerator::from_config(&config));
        drop(generator);
    }

    #[tokio::test]
    async fn mock_generator_returns_fixed_answer() {
        let generator = MockAnswerGenerator::ok("forty-two");
        let answer = generator.generate("anything").await.unwrap();
        assert_eq!(answer, "forty-two");
    }

    #[tokio::test]
    async fn failing_mock_returns_timeout() {
        let generator = MockAnswerGenerator::failing();
        assert!(matches!(
            generator.generate("anything").await,
            Err(AnswerError::Timeout)
        ));
    }
}
