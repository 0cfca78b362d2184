//! # Core Infrastructure
//!
//! Shared plumbing used by the provider adapters.

pub mod http_client;

pub use http_client::{HttpClientBuilder, HttpClientConfig, HttpClientError, PoolConfig};
