//! OpenAI Oracle - Implementation of LanguageOracle for OpenAI's chat API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let oracle = OpenAIOracle::new(config)?;
//! ```
//!
//! Requests flagged with `json_output` ask the API for a JSON object
//! response (`response_format: {"type": "json_object"}`).

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::ports::{
    FinishReason, LanguageOracle, MessageRole, OracleError, OracleInfo, OracleRequest,
    OracleResponse, TokenUsage,
};

/// Base delay of the exponential retry backoff.
const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Configuration for the OpenAI oracle.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Longest pause between attempts. A provider asking for a longer
    /// wait ends the call instead.
    pub max_retry_wait: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            max_retry_wait: Duration::from_secs(2),
        }
    }

    /// Creates a configuration from an already-wrapped secret.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            ..Self::new(String::new())
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_retry_wait(mut self, wait: Duration) -> Self {
        self.max_retry_wait = wait;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI chat completions oracle.
pub struct OpenAIOracle {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIOracle {
    /// Creates a new OpenAI oracle with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &OracleRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_output.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }

    async fn send_request(&self, request: &OracleRequest) -> Result<Response, OracleError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&self.to_openai_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::timeout(self.config.timeout)
                } else if e.is_connect() {
                    OracleError::network(format!("Connection failed: {}", e))
                } else {
                    OracleError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(response: Response) -> Result<Response, OracleError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(Self::status_error(status.as_u16(), error_body))
    }

    /// Maps a non-success HTTP status onto an oracle error.
    fn status_error(status: u16, error_body: String) -> OracleError {
        match status {
            401 | 403 => OracleError::AuthenticationFailed,
            429 => OracleError::rate_limited(Self::parse_retry_after(&error_body)),
            400 if error_body.contains("content_filter") => OracleError::content_filtered(error_body),
            400 => OracleError::InvalidRequest(error_body),
            500..=599 => OracleError::unavailable(format!("Server error {}: {}", status, error_body)),
            _ => OracleError::network(format!("Unexpected status {}: {}", status, error_body)),
        }
    }

    /// Parses "try again in Ns" from an error body, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|parsed| {
                let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
                let idx = message.find("try again in ")?;
                let digits: String = message[idx + 13..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse().ok()
            })
            .unwrap_or(30)
    }

    async fn parse_response(response: Response) -> Result<OracleResponse, OracleError> {
        let response = Self::handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| OracleError::parse(format!("Failed to parse response: {}", e)))?;

        Self::into_oracle_response(openai_response)
    }

    fn into_oracle_response(openai_response: OpenAIResponse) -> Result<OracleResponse, OracleError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(OracleResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }

    async fn attempt(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        let response = self.send_request(request).await?;
        Self::parse_response(response).await
    }

    /// Pause before retry number `retry_count + 1`, or `None` to give up.
    ///
    /// Backs off exponentially (250ms, 500ms, 1s, ...) up to
    /// `max_retry_wait`. A rate limit waits at least the provider's
    /// retry-after, and gives up when that is longer than `max_retry_wait`.
    fn retry_delay(&self, err: &OracleError, retry_count: u32) -> Option<Duration> {
        if !err.is_retryable() || retry_count >= self.config.max_retries {
            return None;
        }
        let backoff = BACKOFF_BASE
            .saturating_mul(1 << retry_count.min(16))
            .min(self.config.max_retry_wait);

        match err {
            OracleError::RateLimited { retry_after_secs } => {
                let delay = backoff.max(Duration::from_secs(u64::from(*retry_after_secs)));
                (delay <= self.config.max_retry_wait).then_some(delay)
            }
            _ => Some(backoff),
        }
    }
}

#[async_trait]
impl LanguageOracle for OpenAIOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError> {
        let mut retry_count = 0;

        loop {
            let err = match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            let Some(delay) = self.retry_delay(&err, retry_count) else {
                return Err(err);
            };
            debug!(error = %err, retry = retry_count + 1, ?delay, "Retrying oracle request");
            sleep(delay).await;
            retry_count += 1;
        }
    }

    fn oracle_info(&self) -> OracleInfo {
        OracleInfo::new("openai", &self.config.model)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
