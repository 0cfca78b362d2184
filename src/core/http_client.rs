//! # HTTP Client Factory
//!
//! Builds the single pooled upstream client every provider adapter shares.
//! Only the connect phase is bounded by default; generations are long-lived
//! streams.

use crate::config::Config;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// HTTP client configuration errors
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("Failed to build HTTP client: {0}")]
    BuildError(#[from] reqwest::Error),
}

/// HTTP client pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub keepalive: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout; `None` for streaming use
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub pool: PoolConfig,
    pub compression: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            pool: PoolConfig::default(),
            compression: true,
        }
    }
}

impl From<&Config> for HttpClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(config.http_connect_timeout),
            pool: PoolConfig {
                max_idle_per_host: config.http_client_max_connections_per_host,
                idle_timeout: Duration::from_secs(120),
                keepalive: Some(Duration::from_secs(60)),
            },
            compression: true,
        }
    }
}

/// HTTP client builder with configurable options
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new HTTP client builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Create HTTP client builder from application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: HttpClientConfig::from(config),
        }
    }

    /// Set a whole-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Enable or disable response decompression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Build the HTTP client
    pub fn build(self) -> Result<Client, HttpClientError> {
        let mut builder = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .pool_max_idle_per_host(self.config.pool.max_idle_per_host)
            .pool_idle_timeout(self.config.pool.idle_timeout)
            .tcp_nodelay(true);

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(keepalive) = self.config.pool.keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder = builder.gzip(self.config.compression).brotli(self.config.compression);

        builder.build().map_err(HttpClientError::from)
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
