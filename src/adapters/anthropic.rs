//! # Anthropic Adapter Module
//!
//! Streams completions from the Anthropic Messages API.
//!
//! ## Native events:
//! - `content_block_delta` / `text_delta` carries the next text fragment
//! - `message_stop` ends the generation
//! - `error` reports a failure mid-stream (e.g. `overloaded_error`)
//! - `message_start`, `content_block_start`, `message_delta`, `ping` are ignored

use crate::{
    adapters::base::{sse_event_stream, AdapterTrait, AdapterUtils, ChatMessage, EventStream},
    config::Config,
    credentials::ProviderCredential,
    error::GatewayError,
    schemas::{Provider, UniformEvent},
};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// # Anthropic Adapter
#[derive(Clone, Debug)]
pub struct AnthropicAdapter {
    /// Base URL, e.g. "https://api.anthropic.com"
    base: String,
    /// Value of the anthropic-version header
    version: String,
    /// max_tokens sent with every request
    max_tokens: u32,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: BlockDelta },
    MessageStop,
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

impl AnthropicAdapter {
    pub fn new(base: String, version: String, max_tokens: u32, client: Client) -> Self {
        Self {
            base,
            version,
            max_tokens,
            client,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            config.anthropic_base_url.clone(),
            config.anthropic_version.clone(),
            config.anthropic_max_tokens,
            client,
        )
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base.trim_end_matches('/'))
    }
}

/// Map one Anthropic SSE `data:` payload to a uniform event.
pub fn parse_anthropic_event(data: &str) -> Option<UniformEvent> {
    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(err) => {
            debug!(error = %err, "skipping malformed anthropic event");
            return None;
        }
    };

    match event {
        StreamEvent::ContentBlockDelta {
            delta: BlockDelta::TextDelta { text },
        } if !text.is_empty() => Some(UniformEvent::Delta { text }),
        StreamEvent::ContentBlockDelta { .. } => None,
        StreamEvent::MessageStop => Some(UniformEvent::Terminal),
        StreamEvent::Error { error } => Some(UniformEvent::failure(
            error
                .message
                .or(error.kind)
                .unwrap_or_else(|| "anthropic stream error".to_string()),
        )),
        StreamEvent::Other => None,
    }
}

#[async_trait::async_trait]
impl AdapterTrait for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    async fn open_stream(&self, model: &str, prompt: &str, credential: &ProviderCredential) -> EventStream {
        AdapterUtils::log_request(self.name(), self.base_url(), model, prompt.len());
        let start_time = Instant::now();

        let body = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            stream: true,
            messages: [ChatMessage::user(prompt)],
        };

        let response = match self
            .client
            .post(self.messages_url())
            .header("x-api-key", credential.expose())
            .header("anthropic-version", &self.version)
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(adapter = self.name(), error = %err, "anthropic request failed");
                return AdapterUtils::failure_stream(GatewayError::from(err).to_string());
            }
        };

        let status = response.status();
        AdapterUtils::log_response(self.name(), model, status.as_u16(), start_time.elapsed().as_millis() as u64);

        if !status.is_success() {
            let message = AdapterUtils::read_error_response(response).await;
            warn!(adapter = self.name(), %status, "anthropic rejected request: {}", message);
            return AdapterUtils::failure_stream(message);
        }

        sse_event_stream(self.name(), response, parse_anthropic_event)
    }
}
