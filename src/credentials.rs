//! # Provider Credentials
//!
//! Credentials are resolved once at startup and never mutated afterwards;
//! the resulting set is shared read-only by every request.

use crate::{config::Config, schemas::Provider};
use std::fmt;

/// A provider API secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential(String);

impl ProviderCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for building upstream auth headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProviderCredential(***)")
    }
}

/// The process-wide credential set, one optional entry per provider.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    anthropic: Option<ProviderCredential>,
    groq: Option<ProviderCredential>,
}

impl Credentials {
    /// Resolve credentials from configuration. Blank values count as absent.
    pub fn from_config(config: &Config) -> Self {
        Self {
            anthropic: non_blank(config.anthropic_api_key.as_deref()),
            groq: non_blank(config.groq_api_key.as_deref()),
        }
    }

    pub fn with(mut self, provider: Provider, credential: ProviderCredential) -> Self {
        match provider {
            Provider::Anthropic => self.anthropic = Some(credential),
            Provider::Groq => self.groq = Some(credential),
        }
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&ProviderCredential> {
        match provider {
            Provider::Anthropic => self.anthropic.as_ref(),
            Provider::Groq => self.groq.as_ref(),
        }
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<ProviderCredential> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ProviderCredential::new)
}
