//! LLM Client: the Generation Service boundary for the chat pipeline.
//!
//! ARCHITECTURAL RULE: No other module may call the model API directly.
//! Everything downstream sees only an ordered `GenerationEvent` stream.
//!
//! Backend: xAI chat completions (OpenAI-compatible, SSE streaming). Reasoning
//! models report their chain of thought in `delta.reasoning_content`.
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::chat::Message;

pub mod stream;

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-3-mini";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Which channel of the generation a delta belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Reasoning,
    Answer,
}

/// One fragment of model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationEvent {
    pub kind: EventKind,
    pub text_delta: String,
}

impl GenerationEvent {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Reasoning,
            text_delta: text.into(),
        }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Answer,
            text_delta: text.into(),
        }
    }
}

/// Ordered event sequence for one generation. The stream ending is the end
/// signal; an `Err` item ends it early.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent, LlmError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    /// `"low"` or `"high"` for reasoning models; omitted when `None`.
    pub reasoning_effort: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: MAX_TOKENS,
            reasoning_effort: None,
        }
    }
}

/// The generation backend. Carried in `AppState` as `Arc<dyn GenerationService>`
/// so tests can drive the pipeline with scripted events.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Opens a generation. Errors returned here happen before any event.
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<EventStream, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn chat_request<'a>(
    messages: &'a [Message],
    options: &'a GenerationOptions,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model: &options.model,
        messages: messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        max_tokens: options.max_tokens,
        stream: true,
        reasoning_effort: options.reasoning_effort.as_deref(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Streaming client for the xAI chat completions API.
#[derive(Clone)]
pub struct XaiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl XaiClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        // No overall request timeout: the body is a long-lived stream and the
        // turn deadline is enforced by the caller.
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GenerationService for XaiClient {
    /// Sends the request and returns once response headers arrive.
    /// Retries on 429, 5xx and transport errors with exponential backoff. No
    /// retry happens after this returns, so no event is ever replayed.
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<EventStream, LlmError> {
        let request_body = chat_request(messages, options);
        let url = format!("{}/chat/completions", self.base_url);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Generation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("accept", "text/event-stream")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Generation API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!(
                "Generation stream opened: model={}, messages={}",
                options.model,
                messages.len()
            );

            return Ok(into_event_stream(response));
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Maps the SSE body to generation events, ending at `[DONE]`.
fn into_event_stream(response: reqwest::Response) -> EventStream {
    let mut sse = response.bytes_stream().eventsource();

    Box::pin(async_stream::stream! {
        while let Some(item) = sse.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    yield Err(LlmError::Stream(e.to_string()));
                    break;
                }
            };

            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == stream::DONE_MARKER {
                break;
            }

            match stream::parse_chunk(data) {
                Ok(events) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    })
}
