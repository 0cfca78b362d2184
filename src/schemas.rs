//! # Schemas Module
//!
//! Data structures shared by the gateway, the provider adapters and the
//! client consumer: the inbound completion request, the closed provider set,
//! the uniform event model and the JSON payload carried by each wire frame.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// # Provider
///
/// The closed set of upstream language-model providers the gateway can
/// dispatch to. The serialized form is the lowercase wire name used in
/// completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Groq,
}

impl Provider {
    /// Every supported provider, in a stable order.
    pub const ALL: [Provider; 2] = [Provider::Anthropic, Provider::Groq];

    /// Wire name used in requests and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
        }
    }

    /// Environment variable that carries this provider's credential
    pub fn credential_env(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| GatewayError::BadRequest(format!("Unsupported provider: {}", s)))
    }
}

/// # Generate Request Body
///
/// The inbound JSON body exactly as the caller sent it. Every field is kept
/// as a raw JSON value so that missing fields and wrongly typed fields are
/// reported as validation errors rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    pub prompt: Option<Value>,
    pub provider: Option<Value>,
    pub model: Option<Value>,
}

/// # Completion Request
///
/// A validated, immutable request to generate text for `prompt` with
/// `model` on `provider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub provider: Provider,
    pub model: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, provider: Provider, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider,
            model: model.into(),
        }
    }
}

impl TryFrom<GenerateBody> for CompletionRequest {
    type Error = GatewayError;

    /// Field presence is checked before the provider name is resolved, so a
    /// body missing several fields always reports the first missing one.
    fn try_from(body: GenerateBody) -> Result<Self, Self::Error> {
        let prompt = required_string("prompt", body.prompt)?;
        let provider = required_string("provider", body.provider)?;
        let model = required_string("model", body.model)?;

        Ok(Self {
            prompt,
            provider: provider.parse()?,
            model,
        })
    }
}

fn required_string(field: &str, value: Option<Value>) -> Result<String, GatewayError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(GatewayError::BadRequest(format!("'{}' must not be empty", field))),
        Some(Value::Null) | None => Err(GatewayError::BadRequest(format!("Missing required field '{}'", field))),
        Some(_) => Err(GatewayError::BadRequest(format!("'{}' must be a string", field))),
    }
}

/// # Uniform Event
///
/// Provider-independent unit of a generation stream. `Terminal` and
/// `Failure` end the stream; nothing is produced after either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniformEvent {
    /// A non-empty fragment of generated text, in arrival order
    Delta { text: String },
    /// Generation finished successfully
    Terminal,
    /// The upstream call or the gateway failed
    Failure { message: String },
}

impl UniformEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure { message: message.into() }
    }

    /// True for the events after which a stream must end
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal | Self::Failure { .. })
    }
}

/// # Frame Payload
///
/// JSON body of one `data:` frame on the gateway's outbound stream. Exactly
/// one of the fields is set by the encoder; the decoder tolerates either or
/// both and ignores unknown fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
