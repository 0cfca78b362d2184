//! # Streaming Module
//!
//! Wire encoding and decoding of the gateway's event stream, plus assembly
//! of the `text/event-stream` HTTP response the dispatcher returns.
//!
//! ## Wire format:
//! - `data: {"text":"<fragment>"}\n\n` for each generated fragment
//! - `data: {"error":"<message>"}\n\n` on failure
//! - `data: [DONE]\n\n` on successful completion

pub mod core;
pub mod frame;

pub use core::{encode_frame, frame_data, DONE_SENTINEL, SSE_CONTENT_TYPE};
pub use frame::{FrameDecoder, FrameOverflow, MAX_LINE_BYTES};

use crate::schemas::UniformEvent;
use futures_util::{future, Stream, StreamExt};

/// Pass events through up to and including the first `Terminal` or
/// `Failure`, then end the stream.
pub fn until_terminal<S>(events: S) -> impl Stream<Item = UniformEvent>
where
    S: Stream<Item = UniformEvent>,
{
    events.scan(false, |finished, event| {
        if *finished {
            return future::ready(None);
        }
        *finished = event.is_terminal();
        future::ready(Some(event))
    })
}

#[cfg(feature = "server")]
pub use response::create_streaming_response;

#[cfg(feature = "server")]
mod response {
    use super::{encode_frame, until_terminal, SSE_CONTENT_TYPE};
    use crate::{adapters::EventStream, error::GatewayError, schemas::UniformEvent};
    use axum::{
        body::Body,
        http::{header, StatusCode},
        response::Response,
    };
    use bytes::Bytes;
    use futures_util::StreamExt;
    use std::convert::Infallible;
    use tracing::{debug, info, warn};
    use uuid::Uuid;

    /// Tracks one outbound stream so an early drop (client disconnect) is
    /// visible in the logs.
    struct StreamProgress {
        request_id: Uuid,
        deltas: usize,
        finished: bool,
    }

    impl StreamProgress {
        fn record(&mut self, event: &UniformEvent) {
            match event {
                UniformEvent::Delta { text } => {
                    self.deltas += 1;
                    debug!(request_id = %self.request_id, bytes = text.len(), "forwarding delta");
                }
                UniformEvent::Terminal => {
                    self.finished = true;
                    info!(request_id = %self.request_id, deltas = self.deltas, "stream completed");
                }
                UniformEvent::Failure { message } => {
                    self.finished = true;
                    warn!(request_id = %self.request_id, deltas = self.deltas, error = %message, "stream failed");
                }
            }
        }
    }

    impl Drop for StreamProgress {
        fn drop(&mut self) {
            if !self.finished {
                info!(
                    request_id = %self.request_id,
                    deltas = self.deltas,
                    "stream closed before completion, upstream released"
                );
            }
        }
    }

    /// Build the `200 text/event-stream` response that forwards `events`
    /// frame by frame as they arrive.
    pub fn create_streaming_response(events: EventStream, request_id: Uuid) -> Result<Response, GatewayError> {
        let mut progress = StreamProgress {
            request_id,
            deltas: 0,
            finished: false,
        };

        let frames = until_terminal(events).map(move |event| {
            progress.record(&event);
            Ok::<Bytes, Infallible>(encode_frame(&event))
        });

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, SSE_CONTENT_TYPE)
            .header(header::CACHE_CONTROL, "no-cache")
            .header("x-request-id", request_id.to_string())
            .body(Body::from_stream(frames))
            .map_err(|e| GatewayError::Internal(format!("Failed to build response: {}", e)))
    }
}
