//! # Completion Client
//!
//! Caller-side consumer of the gateway's event stream.
//!
//! The byte stream is decoded by [`StreamConsumer`], a transport-independent
//! state machine:
//!
//! ```text
//! INIT -> STREAMING -> COMPLETED | FAILED | ABORTED
//! ```
//!
//! [`decode_stream`] wraps it as a single-consumer async sequence of text
//! fragments; [`collect_text`] accumulates that sequence and reports the
//! text-so-far after every fragment. [`CompletionClient`] ties both to an
//! HTTP request against a running gateway.
//!
//! Connection close is an implicit successful end once any text has
//! arrived; a close with no text at all rejects with
//! [`ConsumerError::NoResponse`].

use crate::{
    core::http_client::HttpClientBuilder,
    error::ConsumerError,
    schemas::{CompletionRequest, FramePayload},
    streaming::{FrameDecoder, DONE_SENTINEL, SSE_CONTENT_TYPE},
};
use bytes::Bytes;
use futures_util::{
    stream::{self, BoxStream},
    Stream, StreamExt,
};
use reqwest::{header, Client};
use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Text fragments in arrival order; ends after completion or the first error
pub type TextStream = BoxStream<'static, Result<String, ConsumerError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsumerState {
    /// Request issued, no bytes read yet
    #[default]
    Init,
    Streaming,
    Completed,
    Failed,
    Aborted,
}

impl ConsumerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

/// # Stream Consumer
///
/// Decodes gateway frames from raw byte chunks. Each call returns the items
/// produced by that input: `Ok(fragment)` for text, `Err` for the failure
/// that ended the stream. Input after a terminal state is ignored.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    state: ConsumerState,
    decoder: FrameDecoder,
    received_text: bool,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Feed one chunk read from the transport.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, ConsumerError>> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        self.state = ConsumerState::Streaming;

        let (frames, overflow) = self.decoder.push(chunk);
        let mut items = self.decode_frames(frames);

        if let Some(overflow) = overflow {
            if !self.state.is_terminal() {
                self.state = ConsumerState::Failed;
                items.push(Err(ConsumerError::Framing(overflow.to_string())));
            }
        }

        items
    }

    /// The transport closed. Flushes any unterminated final frame, then
    /// resolves a still-open stream: COMPLETED if text has arrived,
    /// otherwise FAILED with [`ConsumerError::NoResponse`].
    pub fn finish(&mut self) -> Vec<Result<String, ConsumerError>> {
        if self.state.is_terminal() {
            return Vec::new();
        }

        let mut items = match self.decoder.finish() {
            Some(data) => self.decode_frames(vec![data]),
            None => Vec::new(),
        };

        if !self.state.is_terminal() {
            if self.received_text {
                self.state = ConsumerState::Completed;
            } else {
                self.state = ConsumerState::Failed;
                items.push(Err(ConsumerError::NoResponse));
            }
        }

        items
    }

    /// The transport failed mid-read. Once text has arrived this resolves
    /// like a close; before that the stream is ABORTED.
    pub fn interrupt(&mut self, reason: impl Into<String>) -> Vec<Result<String, ConsumerError>> {
        if self.received_text {
            return self.finish();
        }
        self.abort(reason).map(Err).into_iter().collect()
    }

    /// Sever the stream. Returns the rejection unless the stream had
    /// already resolved.
    pub fn abort(&mut self, reason: impl Into<String>) -> Option<ConsumerError> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = ConsumerState::Aborted;
        Some(ConsumerError::Aborted(reason.into()))
    }

    fn decode_frames(&mut self, frames: Vec<String>) -> Vec<Result<String, ConsumerError>> {
        let mut items = Vec::new();
        for data in frames {
            if let Some(item) = self.decode_frame(&data) {
                items.push(item);
            }
            if self.state.is_terminal() {
                break;
            }
        }
        items
    }

    fn decode_frame(&mut self, data: &str) -> Option<Result<String, ConsumerError>> {
        if data.trim() == DONE_SENTINEL {
            self.state = ConsumerState::Completed;
            return None;
        }

        let payload: FramePayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, frame = data, "skipping malformed frame");
                return None;
            }
        };

        if let Some(message) = payload.error {
            self.state = ConsumerState::Failed;
            return Some(Err(ConsumerError::Upstream(message)));
        }

        match payload.text {
            Some(text) if !text.is_empty() => {
                self.received_text = true;
                Some(Ok(text))
            }
            _ => None,
        }
    }
}

struct DecodeState<E> {
    bytes: BoxStream<'static, Result<Bytes, E>>,
    consumer: StreamConsumer,
    pending: VecDeque<Result<String, ConsumerError>>,
}

/// Decode a gateway byte stream into text fragments.
///
/// A transport error after text has arrived ends the stream like a close;
/// before any text it moves the consumer to ABORTED. The byte stream is
/// dropped as soon as the consumer reaches a terminal state.
pub fn decode_stream<S, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        bytes: bytes.boxed(),
        consumer: StreamConsumer::new(),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.consumer.state().is_terminal() {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let items = state.consumer.feed(&chunk);
                    state.pending.extend(items);
                }
                Some(Err(err)) => {
                    warn!(error = %err, "gateway stream interrupted");
                    let items = state.consumer.interrupt(err.to_string());
                    state.pending.extend(items);
                }
                None => {
                    let items = state.consumer.finish();
                    state.pending.extend(items);
                }
            }
        }
    })
    .boxed()
}

/// Accumulate fragments in order, calling `on_progress` with the full text
/// so far after each one. On error the partial text is discarded.
pub async fn collect_text<S, F>(mut fragments: S, mut on_progress: F) -> Result<String, ConsumerError>
where
    S: Stream<Item = Result<String, ConsumerError>> + Unpin,
    F: FnMut(&str),
{
    let mut accumulated = String::new();
    while let Some(fragment) = fragments.next().await {
        accumulated.push_str(&fragment?);
        on_progress(&accumulated);
    }
    Ok(accumulated)
}

/// # Completion Client
///
/// Posts completion requests to a gateway endpoint and consumes the
/// streamed reply.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    endpoint: Url,
}

impl CompletionClient {
    /// Client for the gateway's generate endpoint, e.g.
    /// `http://localhost:8080/api/generate`
    pub fn new(endpoint: &str) -> Result<Self, ConsumerError> {
        let url = Url::parse(endpoint)
            .map_err(|e| ConsumerError::Request(format!("invalid gateway URL '{}': {}", endpoint, e)))?;
        let http = HttpClientBuilder::new()
            .build()
            .map_err(|e| ConsumerError::Request(e.to_string()))?;

        Ok(Self::with_client(http, url))
    }

    pub fn with_client(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Send `request` and return its fragment stream once the gateway has
    /// accepted it. A non-success status rejects with
    /// [`ConsumerError::Http`] carrying the gateway's `error` message.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, ConsumerError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::ACCEPT, SSE_CONTENT_TYPE)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<FramePayload>(&body)
                .ok()
                .and_then(|payload| payload.error)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request rejected").to_string()
                    } else {
                        body.trim().to_string()
                    }
                });
            return Err(ConsumerError::Http {
                status: status.as_u16(),
                message,
            });
        }

        debug!(provider = %request.provider, model = %request.model, "gateway accepted completion request");
        Ok(decode_stream(response.bytes_stream()))
    }

    /// Run a completion to the end, reporting accumulated text after every
    /// fragment.
    pub async fn complete<F>(&self, request: &CompletionRequest, on_progress: F) -> Result<String, ConsumerError>
    where
        F: FnMut(&str),
    {
        let fragments = self.stream(request).await?;
        collect_text(fragments, on_progress).await
    }

    /// Like [`complete`](Self::complete), but abandons the request once
    /// `deadline` elapses, closing the transport.
    pub async fn complete_with_deadline<F>(
        &self,
        request: &CompletionRequest,
        deadline: Duration,
        on_progress: F,
    ) -> Result<String, ConsumerError>
    where
        F: FnMut(&str),
    {
        match tokio::time::timeout(deadline, self.complete(request, on_progress)).await {
            Ok(result) => result,
            Err(_) => Err(ConsumerError::Aborted(format!(
                "deadline of {}ms exceeded",
                deadline.as_millis()
            ))),
        }
    }
}
