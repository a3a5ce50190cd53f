use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Sampling parameters, fixed for every request.
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 256;
const TOP_P: f32 = 0.95;

/// Failure modes of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The provider throttled the request. Safe to retry after a wait.
    #[error("rate limited by provider")]
    RateLimited,
    /// Any other failure: network fault, malformed response, provider-side
    /// error. Not retryable.
    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for the Groq chat-completions endpoint (OpenAI-compatible).
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &Config, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: config.api_base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Request one completion for the given system prompt and user message.
    ///
    /// `user_message` is expected to be non-empty; the composer rejects blank
    /// submissions before they reach this call. On success, returns the first
    /// generated choice's text verbatim.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, CompletionError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| CompletionError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Provider(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::Provider("provider returned no completion choices".to_string())
            })
    }
}

/// Map a non-success response to the error taxonomy.
///
/// 429, or an error body mentioning rate limits, is the transient class;
/// everything else surfaces as a provider error.
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let lowered = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("rate_limit")
        || lowered.contains("429")
    {
        CompletionError::RateLimited
    } else {
        CompletionError::Provider(format!("Groq API error {status}: {body}"))
    }
}
