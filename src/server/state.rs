//! # Application State
//!
//! Shared, read-only state handed to every handler: configuration, the
//! resolved credential set and the provider adapter registry.

use crate::{
    adapters::AdapterRegistry,
    config::Config,
    core::http_client::HttpClientBuilder,
    credentials::Credentials,
    error::GatewayError,
};
use std::sync::Arc;

/// # Application State
///
/// Built once at startup. Cloning is cheap; nothing in here changes while
/// the server runs.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    credentials: Arc<Credentials>,
    adapters: AdapterRegistry,
}

impl AppState {
    /// Create application state, resolving credentials from `config`
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let credentials = Credentials::from_config(&config);
        Self::with_credentials(config, credentials)
    }

    /// Create application state with an explicit credential set
    pub fn with_credentials(config: Config, credentials: Credentials) -> Result<Self, GatewayError> {
        let http_client = HttpClientBuilder::from_config(&config)
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let adapters = AdapterRegistry::from_config(&config, http_client);

        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            adapters,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::AdapterTrait, credentials::ProviderCredential, schemas::Provider};

    #[test]
    fn test_app_state_creation() {
        let mut config = Config::for_test();
        config.groq_api_key = Some("gsk-test".to_string());

        let state = AppState::new(config).unwrap();

        assert!(state.credentials().is_configured(Provider::Groq));
        assert!(!state.credentials().is_configured(Provider::Anthropic));
        assert_eq!(state.adapters().get(Provider::Groq).name(), "groq");
    }

    #[test]
    fn test_explicit_credentials() {
        let credentials = Credentials::default().with(Provider::Anthropic, ProviderCredential::new("sk-ant"));
        let state = AppState::with_credentials(Config::for_test(), credentials).unwrap();

        assert_eq!(
            state.credentials().get(Provider::Anthropic).map(ProviderCredential::expose),
            Some("sk-ant")
        );
    }
}
