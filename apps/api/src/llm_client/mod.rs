//! LLM Client — the single point of entry for all Gemini API calls in AquaPi.
//!
//! ARCHITECTURAL RULE: No other module may call the generative API directly.
//! Every request goes through `LlmClient::call`, which owns the retry and
//! cancellation behaviour:
//!
//! - at most `RetryPolicy::max_attempts` attempts (5)
//! - 429 with attempts left: sleep `2^attempt * 1s + U(0, 1s)` and retry
//! - 5xx and transport errors: retry immediately
//! - any other non-success status: terminal
//! - cancellation wins over any in-flight attempt or backoff sleep

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// The model used for all generative calls.
/// Hardcoded so every feature talks to the same model.
pub const MODEL: &str = "gemini-2.5-flash-preview-05-20";
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub const CONNECTION_TROUBLE_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";
pub const EMPTY_RESPONSE_MESSAGE: &str =
    "I'm sorry, I couldn't process that. The response was empty.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts (last error: {last})")]
    Exhausted { attempts: u32, last: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// The plain-language text shown to end users. Cancellation is silent.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            LlmError::Cancelled => None,
            LlmError::EmptyContent => Some(EMPTY_RESPONSE_MESSAGE),
            _ => Some(CONNECTION_TROUBLE_MESSAGE),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single-turn request with one user message.
    pub fn user_prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(text)],
            generation_config: None,
        }
    }

    /// Asks the model for JSON matching `schema`.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role("model", text)
    }

    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transport
// ────────────────────────────────────────────────────────────────────────────

/// Raw HTTP result of one attempt.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// One POST of a request body to the generative endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, body: &GenerateContentRequest) -> Result<HttpReply, LlmError>;
}

pub struct ReqwestTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            endpoint: format!(
                "{}/v1beta/models/{MODEL}:generateContent",
                base_url.trim_end_matches('/')
            ),
            api_key,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, body: &GenerateContentRequest) -> Result<HttpReply, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(HttpReply { status, body })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay after a rate-limited attempt (0-based): `2^attempt * base + U(0, max_jitter)`.
    pub fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..jitter_ms)
        };
        exp + Duration::from_millis(jitter)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single generative-API client used by all services.
#[derive(Clone)]
pub struct LlmClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self::with_transport(
            Arc::new(ReqwestTransport::new(api_key, base_url)?),
            RetryPolicy::default(),
        ))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Sends `request` under the retry policy and returns the extracted text.
    pub async fn call(
        &self,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..max_attempts {
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                sent = self.transport.post(request) => sent,
            };

            let reply = match sent {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("LLM call attempt {} failed: {e}", attempt + 1);
                    last_error = Some(e);
                    continue;
                }
            };

            match reply.status {
                200..=299 => {
                    let envelope: GenerateContentResponse = serde_json::from_str(&reply.body)?;
                    let text = envelope.text().ok_or(LlmError::EmptyContent)?;
                    debug!("LLM call succeeded on attempt {}", attempt + 1);
                    return Ok(text.to_string());
                }
                429 => {
                    last_error = Some(LlmError::Api {
                        status: 429,
                        message: reply.body,
                    });
                    if attempt + 1 < max_attempts {
                        let delay = self.policy.backoff(attempt, &mut rand::thread_rng());
                        warn!(
                            "LLM rate limited on attempt {}, retrying after {}ms...",
                            attempt + 1,
                            delay.as_millis()
                        );
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                status if status >= 500 => {
                    warn!("LLM API returned {status} on attempt {}", attempt + 1);
                    last_error = Some(LlmError::Api {
                        status,
                        message: reply.body,
                    });
                }
                status => {
                    return Err(LlmError::Api {
                        status,
                        message: reply.body,
                    });
                }
            }
        }

        Err(LlmError::Exhausted {
            attempts: max_attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    /// Requests JSON matching `schema` and deserializes it. Text that does not
    /// parse is handed to `fallback` instead of failing the call.
    pub async fn call_structured<T, F>(
        &self,
        request: GenerateContentRequest,
        schema: Value,
        cancel: &CancellationToken,
        fallback: F,
    ) -> Result<T, LlmError>
    where
        T: DeserializeOwned,
        F: FnOnce(&str) -> T,
    {
        let request = request.with_schema(schema);
        let text = self.call(&request, cancel).await?;

        match parse_structured(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Structured response did not parse ({e}); using fallback");
                Ok(fallback(&text))
            }
        }
    }
}

/// Parses model text as JSON, tolerating markdown code fences around it.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_json_fences(text))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted transport for tests
// ────────────────────────────────────────────────────────────────────────────
