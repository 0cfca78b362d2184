//! # Provider Adapters Module
//!
//! Each adapter opens a streaming completion against one upstream provider
//! and normalizes that provider's native events into [`UniformEvent`]s.
//!
//! ## Supported Providers:
//!
//! - **Anthropic**: Messages API with `content_block_delta` events
//! - **Groq**: OpenAI-compatible chat completions with `[DONE]` termination
//!
//! Adding a provider means adding a [`Provider`] variant, an adapter module
//! and an [`Adapter`] variant; the dispatcher selects by provider and never
//! branches on provider names itself.
//!
//! [`UniformEvent`]: crate::schemas::UniformEvent

use crate::{config::Config, credentials::ProviderCredential, schemas::Provider};
use reqwest::Client;

pub mod anthropic;
pub mod base;
pub mod groq;

pub use anthropic::AnthropicAdapter;
pub use base::{AdapterTrait, AdapterUtils, EventStream};
pub use groq::GroqAdapter;

/// # Provider Adapter
///
/// The closed set of adapters, one variant per [`Provider`].
#[derive(Clone, Debug)]
pub enum Adapter {
    Anthropic(AnthropicAdapter),
    Groq(GroqAdapter),
}

impl Adapter {
    /// Build the adapter for `provider` from configuration
    pub fn for_provider(provider: Provider, config: &Config, client: Client) -> Self {
        match provider {
            Provider::Anthropic => Self::Anthropic(AnthropicAdapter::from_config(config, client)),
            Provider::Groq => Self::Groq(GroqAdapter::from_config(config, client)),
        }
    }

    fn inner(&self) -> &dyn AdapterTrait {
        match self {
            Self::Anthropic(adapter) => adapter as &dyn AdapterTrait,
            Self::Groq(adapter) => adapter,
        }
    }
}

#[async_trait::async_trait]
impl AdapterTrait for Adapter {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn provider(&self) -> Provider {
        self.inner().provider()
    }

    fn base_url(&self) -> &str {
        self.inner().base_url()
    }

    async fn open_stream(&self, model: &str, prompt: &str, credential: &ProviderCredential) -> EventStream {
        self.inner().open_stream(model, prompt, credential).await
    }
}

/// # Adapter Registry
///
/// One adapter per provider, built once at startup and looked up by
/// [`Provider`] for every request.
#[derive(Clone, Debug)]
pub struct AdapterRegistry {
    anthropic: Adapter,
    groq: Adapter,
}

impl AdapterRegistry {
    pub fn from_config(config: &Config, client: Client) -> Self {
        Self {
            anthropic: Adapter::for_provider(Provider::Anthropic, config, client.clone()),
            groq: Adapter::for_provider(Provider::Groq, config, client),
        }
    }

    pub fn get(&self, provider: Provider) -> &Adapter {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::Groq => &self.groq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http_client::HttpClientBuilder;

    #[test]
    fn test_registry_lookup() {
        let client = HttpClientBuilder::new().build().unwrap();
        let registry = AdapterRegistry::from_config(&Config::for_test(), client);

        for provider in Provider::ALL {
            let adapter = registry.get(provider);
            assert_eq!(adapter.provider(), provider);
            assert_eq!(adapter.name(), provider.as_str());
        }
    }

    #[test]
    fn test_adapter_base_urls() {
        let client = HttpClientBuilder::new().build().unwrap();
        let config = Config::for_test();

        let anthropic = Adapter::for_provider(Provider::Anthropic, &config, client.clone());
        assert!(matches!(anthropic, Adapter::Anthropic(_)));
        assert_eq!(anthropic.base_url(), "https://api.anthropic.com");

        let groq = Adapter::for_provider(Provider::Groq, &config, client);
        assert!(matches!(groq, Adapter::Groq(_)));
        assert_eq!(groq.base_url(), "https://api.groq.com/openai/v1");
    }
}
