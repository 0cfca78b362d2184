//! # Stream Encoder
//!
//! Serializes uniform events into the gateway's wire frames. Every event maps
//! to exactly one `data: <payload>\n\n` frame; the encoder holds no state.

use crate::schemas::UniformEvent;
use bytes::Bytes;
use serde_json::json;

/// Payload of the frame that marks successful completion
pub const DONE_SENTINEL: &str = "[DONE]";

/// Content type of the outbound stream
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// The `data:` value for one event
pub fn frame_data(event: &UniformEvent) -> String {
    match event {
        UniformEvent::Delta { text } => json!({ "text": text }).to_string(),
        UniformEvent::Terminal => DONE_SENTINEL.to_string(),
        UniformEvent::Failure { message } => json!({ "error": message }).to_string(),
    }
}

/// The complete wire frame for one event
pub fn encode_frame(event: &UniformEvent) -> Bytes {
    Bytes::from(format!("data: {}\n\n", frame_data(event)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_frame() {
        let frame = encode_frame(&UniformEvent::delta("abc"));
        assert_eq!(&frame[..], b"data: {\"text\":\"abc\"}\n\n");
    }

    #[test]
    fn test_terminal_frame() {
        let frame = encode_frame(&UniformEvent::Terminal);
        assert_eq!(&frame[..], b"data: [DONE]\n\n");
    }

    #[test]
    fn test_delta_text_is_escaped() {
        let frame = encode_frame(&UniformEvent::delta("a \"b\"\nc"));
        assert_eq!(&frame[..], b"data: {\"text\":\"a \\\"b\\\"\\nc\"}\n\n");
    }

    #[test]
    fn test_failure_frame() {
        let frame = encode_frame(&UniformEvent::failure("rate limited"));
        assert_eq!(&frame[..], b"data: {\"error\":\"rate limited\"}\n\n");
    }

    #[test]
    fn test_newlines_stay_inside_one_frame() {
        let frame = encode_frame(&UniformEvent::delta("line one\nline two\n\n"));
        let text = std::str::from_utf8(&frame).unwrap();
        assert_eq!(text.matches('\n').count(), 2);
        assert!(text.ends_with("\n\n"));
    }
}
