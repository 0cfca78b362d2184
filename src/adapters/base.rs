//! # Base Adapter Functionality
//!
//! The capability every provider adapter implements, and the upstream SSE
//! pump that turns a provider's HTTP response body into uniform events.

use crate::{
    credentials::ProviderCredential,
    schemas::{Provider, UniformEvent},
    streaming::FrameDecoder,
};
use futures_util::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A lazy, single-consumer sequence of uniform events for one request.
/// Dropping it releases the upstream connection.
pub type EventStream = BoxStream<'static, UniformEvent>;

/// Base adapter trait that all provider adapters implement
#[async_trait::async_trait]
pub trait AdapterTrait: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// The provider this adapter talks to
    fn provider(&self) -> Provider;

    /// Base URL of the provider API
    fn base_url(&self) -> &str;

    /// Open a streaming completion for `prompt` on `model`.
    ///
    /// Never fails: connection errors, non-2xx statuses and malformed
    /// streams all surface as a single `Failure` event.
    async fn open_stream(&self, model: &str, prompt: &str, credential: &ProviderCredential) -> EventStream;
}

/// Single user turn sent to chat-style provider APIs
#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn user(content: &'a str) -> Self {
        Self { role: "user", content }
    }
}

/// Utility functions for adapters
pub struct AdapterUtils;

impl AdapterUtils {
    /// A stream consisting of one `Failure` event
    pub fn failure_stream(message: impl Into<String>) -> EventStream {
        stream::once(future::ready(UniformEvent::failure(message))).boxed()
    }

    /// Drain a non-success response into a failure message
    pub async fn read_error_response(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::upstream_error_message(status, &body)
    }

    /// Describe a non-success upstream response. Provider error bodies of
    /// the form `{"error": {"message": ...}}` yield their message.
    pub fn upstream_error_message(status: StatusCode, body: &str) -> String {
        let detail = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("error").filter(|e| e.is_string()))
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        match detail {
            Some(message) => format!("HTTP {}: {}", status.as_u16(), message),
            None if body.trim().is_empty() => format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("upstream error")
            ),
            None => format!("HTTP {}: {}", status.as_u16(), body.trim()),
        }
    }

    /// Log adapter request for debugging
    pub fn log_request(adapter_name: &str, base_url: &str, model: &str, prompt_len: usize) {
        debug!(
            adapter = adapter_name,
            base_url = base_url,
            model = model,
            prompt_len = prompt_len,
            "Opening streaming completion"
        );
    }

    /// Log the upstream status once response headers arrive
    pub fn log_response(adapter_name: &str, model: &str, status: u16, response_time_ms: u64) {
        debug!(
            adapter = adapter_name,
            model = model,
            status = status,
            response_time_ms = response_time_ms,
            "Upstream stream opened"
        );
    }
}

struct UpstreamPump<P> {
    adapter: &'static str,
    body: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: FrameDecoder,
    pending: VecDeque<UniformEvent>,
    parse: P,
    finished: bool,
}

impl<P> UpstreamPump<P>
where
    P: FnMut(&str) -> Option<UniformEvent>,
{
    fn enqueue(&mut self, payloads: Vec<String>) {
        for data in payloads {
            if let Some(event) = (self.parse)(&data) {
                self.pending.push_back(event);
            }
        }
    }
}

/// Turn a successful upstream SSE response into uniform events.
///
/// `parse` maps one `data:` payload to at most one event. A body that ends
/// without a native terminal signal yields `Terminal`; a read error yields
/// `Failure`. Nothing is emitted after the first terminal event.
pub fn sse_event_stream<P>(adapter: &'static str, response: Response, parse: P) -> EventStream
where
    P: FnMut(&str) -> Option<UniformEvent> + Send + 'static,
{
    let pump = UpstreamPump {
        adapter,
        body: response.bytes_stream().boxed(),
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        parse,
        finished: false,
    };

    stream::unfold(pump, |mut pump| async move {
        loop {
            if pump.finished {
                return None;
            }

            if let Some(event) = pump.pending.pop_front() {
                pump.finished = event.is_terminal();
                return Some((event, pump));
            }

            match pump.body.next().await {
                Some(Ok(chunk)) => {
                    let (payloads, overflow) = pump.decoder.push(&chunk);
                    pump.enqueue(payloads);
                    if let Some(overflow) = overflow {
                        warn!(adapter = pump.adapter, "{}", overflow);
                        pump.pending.push_back(UniformEvent::failure(format!(
                            "{} stream error: {}",
                            pump.adapter, overflow
                        )));
                    }
                }
                Some(Err(err)) => {
                    warn!(adapter = pump.adapter, error = %err, "upstream read failed");
                    pump.pending.push_back(UniformEvent::failure(format!(
                        "{} stream interrupted: {}",
                        pump.adapter, err
                    )));
                }
                None => {
                    let rest = pump.decoder.finish().into_iter().collect();
                    pump.enqueue(rest);
                    pump.pending.push_back(UniformEvent::Terminal);
                }
            }
        }
    })
    .boxed()
}
