//! # Groq Adapter Module
//!
//! Streams completions from Groq's OpenAI-compatible chat completions API.
//! Each chunk carries `choices[0].delta.content`; the stream ends with a
//! literal `[DONE]` payload.

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

/// # Groq Adapter
#[derive(Clone, Debug)]
pub struct GroqAdapter {
    /// Base URL, e.g. "https://api.groq.com/openai/v1"
    base: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl GroqAdapter {
    pub fn new(base: String, client: Client) -> Self {
        Self { base, client }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(config.groq_base_url.clone(), client)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base.trim_end_matches('/'))
    }
}

/// Map one Groq SSE `data:` payload to a uniform event.
pub fn parse_groq_event(data: &str) -> Option<UniformEvent> {
    let data = data.trim();
    if data == "[DONE]" {
        return Some(UniformEvent::Terminal);
    }

    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            debug!(error = %err, "skipping malformed groq chunk");
            return None;
        }
    };

    if let Some(error) = chunk.error {
        return Some(UniformEvent::failure(
            error.message.unwrap_or_else(|| "groq stream error".to_string()),
        ));
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|text| !text.is_empty())
        .map(|text| UniformEvent::Delta { text })
}

#[async_trait::async_trait]
impl AdapterTrait for GroqAdapter {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn provider(&self) -> Provider {
        Provider::Groq
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    async fn open_stream(&self, model: &str, prompt: &str, credential: &ProviderCredential) -> EventStream {
        AdapterUtils::log_request(self.name(), self.base_url(), model, prompt.len());
        let start_time = Instant::now();

        let body = ChatCompletionRequest {
            model,
            stream: true,
            messages: [ChatMessage::user(prompt)],
        };

        let response = match self
            .client
            .post(self.completions_url())
            .bearer_auth(credential.expose())
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(adapter = self.name(), error = %err, "groq request failed");
                return AdapterUtils::failure_stream(GatewayError::from(err).to_string());
            }
        };

        let status = response.status();
        AdapterUtils::log_response(self.name(), model, status.as_u16(), start_time.elapsed().as_millis() as u64);

        if !status.is_success() {
            let message = AdapterUtils::read_error_response(response).await;
            warn!(adapter = self.name(), %status, "groq rejected request: {}", message);
            return AdapterUtils::failure_stream(message);
        }

        sse_event_stream(self.name(), response, parse_groq_event)
    }
}
