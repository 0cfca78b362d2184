//! # StreamRelay - Streaming Text-Completion Gateway
//!
//! StreamRelay accepts a completion request naming a prompt, a provider and a
//! model, opens a streaming generation against that provider and relays the
//! generated text to the caller, fragment by fragment, as a uniform
//! server-sent event stream. The caller never deals with provider-specific
//! formats, and provider credentials stay on the server.
//!
//! ## Features
//!
//! - **Provider Adapters**: Anthropic Messages API and Groq chat completions,
//!   both normalized into one event model
//! - **Low-Latency Relay**: every fragment is forwarded as soon as it arrives
//! - **Uniform Wire Format**: `data: {"text"}`, `data: {"error"}`, `data: [DONE]`
//! - **Client Consumer**: decodes the stream back into text fragments with
//!   progress callbacks, deadlines and typed errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stream_relay::{create_router, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::for_test(); // or Config::parse_args() for CLI
//!     let addr = config.bind_address();
//!
//!     let state = AppState::new(config)?;
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Consuming the stream:
//!
//! ```rust,no_run
//! use stream_relay::{CompletionClient, CompletionRequest, Provider};
//!
//! # async fn run() -> Result<(), stream_relay::ConsumerError> {
//! let client = CompletionClient::new("http://localhost:8080/api/generate")?;
//! let request = CompletionRequest::new("Say hello", Provider::Groq, "llama-3.1-8b-instant");
//!
//! let text = client
//!     .complete(&request, |so_far| println!("{}", so_far))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`schemas`] - Completion request, provider set, uniform event model
//! - [`adapters`] - Per-provider streaming adapters
//! - [`streaming`] - Frame encoder, frame decoder, SSE response assembly
//! - [`client`] - Caller-side stream consumer
//! - [`server`] - Dispatcher route handlers and application state
//! - [`config`] - Configuration management with CLI and environment support
//! - [`credentials`] - Provider credential set
//! - [`error`] - Error types

// Core infrastructure
pub mod core;

pub mod adapters;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod schemas;
pub mod streaming;

#[cfg(feature = "server")]
pub mod server;

pub use adapters::{Adapter, AdapterRegistry, AdapterTrait, EventStream};
pub use client::{collect_text, decode_stream, CompletionClient, ConsumerState, StreamConsumer, TextStream};
pub use config::Config;
pub use credentials::{Credentials, ProviderCredential};
pub use error::{ConsumerError, GatewayError};
pub use schemas::{CompletionRequest, GenerateBody, Provider, UniformEvent};
pub use streaming::{encode_frame, FrameDecoder};

#[cfg(feature = "server")]
pub use server::{create_router, AppState};

/// Crate-wide result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
