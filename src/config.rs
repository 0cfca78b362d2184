#[cfg(feature = "cli")]
use clap::Parser;
use crate::schemas::Provider;
use tracing::warn;
use url::Url;

/// # StreamRelay Configuration
///
/// Command-line arguments and environment variables, with `.env` file
/// loading, for the gateway host process. Provider keys are optional here:
/// a missing key only fails requests that select that provider.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "stream-relay"))]
#[cfg_attr(feature = "cli", command(about = "Streaming text-completion gateway relaying Anthropic and Groq generations as server-sent events"))]
#[cfg_attr(feature = "cli", command(version))]
pub struct Config {
    // =============================================================================
    // CORE SERVER CONFIGURATION
    // =============================================================================

    /// Server port to listen on
    #[cfg_attr(feature = "cli", arg(short, long, env = "PORT", default_value = "8080"))]
    pub port: u16,

    /// Server host to bind to
    #[cfg_attr(feature = "cli", arg(long, env = "HOST", default_value = "0.0.0.0"))]
    pub host: String,

    // =============================================================================
    // PROVIDER CREDENTIALS
    // =============================================================================

    /// Anthropic API key
    #[cfg_attr(feature = "cli", arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true))]
    pub anthropic_api_key: Option<String>,

    /// Groq API key
    #[cfg_attr(feature = "cli", arg(long, env = "GROQ_API_KEY", hide_env_values = true))]
    pub groq_api_key: Option<String>,

    // =============================================================================
    // PROVIDER ENDPOINTS
    // =============================================================================

    /// Anthropic API base URL (the adapter appends /v1/messages)
    #[cfg_attr(feature = "cli", arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com"))]
    pub anthropic_base_url: String,

    /// Value sent in the anthropic-version header
    #[cfg_attr(feature = "cli", arg(long, env = "ANTHROPIC_VERSION", default_value = "2023-06-01"))]
    pub anthropic_version: String,

    /// max_tokens sent with every Anthropic request
    #[cfg_attr(feature = "cli", arg(long, env = "ANTHROPIC_MAX_TOKENS", default_value = "1024"))]
    pub anthropic_max_tokens: u32,

    /// Groq OpenAI-compatible base URL (the adapter appends /chat/completions)
    #[cfg_attr(feature = "cli", arg(long, env = "GROQ_BASE_URL", default_value = "https://api.groq.com/openai/v1"))]
    pub groq_base_url: String,

    // =============================================================================
    // UPSTREAM HTTP CLIENT
    // =============================================================================

    /// Upstream connect timeout in seconds
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10"))]
    pub http_connect_timeout: u64,

    /// Maximum idle connections kept per upstream host
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CLIENT_MAX_CONNECTIONS_PER_HOST", default_value = "10"))]
    pub http_client_max_connections_per_host: usize,

    // =============================================================================
    // LOGGING AND SECURITY
    // =============================================================================

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[cfg_attr(feature = "cli", arg(long, env = "RUST_LOG", default_value = "info"))]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[cfg_attr(feature = "cli", arg(long, env = "ENVIRONMENT", default_value = "development"))]
    pub environment: String,

    /// CORS origin (use * for development only)
    #[cfg_attr(feature = "cli", arg(long, env = "CORS_ORIGIN", default_value = "*"))]
    pub cors_origin: String,
}

impl Config {
    /// Parse configuration from command line arguments and environment variables.
    ///
    /// Loads `.env` if present, parses arguments, installs the tracing
    /// subscriber, then validates. Invalid configuration exits the process.
    #[cfg(feature = "cli")]
    pub fn parse_args() -> Self {
        let _ = dotenv::dotenv();

        let config = Self::parse();

        config.setup_logging();

        if let Err(err) = config.validate() {
            eprintln!("Configuration validation failed: {}", err);
            std::process::exit(1);
        }

        config.warn_missing_credentials();

        config
    }

    /// Create a test configuration with minimal required fields.
    /// This is used for testing purposes only.
    pub fn for_test() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            anthropic_api_key: None,
            groq_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            anthropic_max_tokens: 1024,
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            http_connect_timeout: 10,
            http_client_max_connections_per_host: 10,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            cors_origin: "*".to_string(),
        }
    }

    /// Install the tracing subscriber with the configured filter.
    #[cfg(feature = "cli")]
    fn setup_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(&self.log_level)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .try_init();
    }

    /// Log a warning for every provider without a credential.
    pub fn warn_missing_credentials(&self) {
        let configured = [
            (Provider::Anthropic, &self.anthropic_api_key),
            (Provider::Groq, &self.groq_api_key),
        ];
        for (provider, key) in configured {
            if key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                warn!(
                    provider = provider.as_str(),
                    "{} is not set; requests for this provider will fail",
                    provider.credential_env()
                );
            }
        }
    }

    /// Validate configuration values and provide helpful error messages.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0. Please specify a valid port number (1-65535).".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty. Please specify a valid host (e.g., '0.0.0.0', 'localhost', or an IP address).".to_string());
        }

        validate_base_url("ANTHROPIC_BASE_URL", &self.anthropic_base_url, &self.environment)?;
        validate_base_url("GROQ_BASE_URL", &self.groq_base_url, &self.environment)?;

        if self.anthropic_version.trim().is_empty() {
            return Err("ANTHROPIC_VERSION cannot be empty.".to_string());
        }

        if self.anthropic_max_tokens == 0 {
            return Err("ANTHROPIC_MAX_TOKENS must be greater than 0.".to_string());
        }

        if self.http_connect_timeout == 0 {
            return Err("HTTP connect timeout must be greater than 0 seconds.".to_string());
        }

        if self.http_client_max_connections_per_host == 0 {
            return Err("HTTP client max connections per host must be greater than 0.".to_string());
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.as_str()) {
            return Err(format!(
                "Invalid environment '{}'. Valid options are: {}",
                self.environment,
                valid_environments.join(", ")
            ));
        }

        if self.log_level.trim().is_empty() {
            return Err("Log level cannot be empty.".to_string());
        }

        if self.cors_origin.is_empty() {
            return Err("CORS origin cannot be empty. Use '*' or a specific origin.".to_string());
        }

        if self.environment == "production" && self.cors_origin == "*" {
            warn!("Using CORS origin '*' in production is not recommended");
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn validate_base_url(name: &str, value: &str, environment: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|err| {
        format!("Invalid {} '{}': {}. Please provide a full URL (e.g., 'https://api.example.com').", name, value, err)
    })?;

    if !["http", "https"].contains(&url.scheme()) {
        return Err(format!(
            "Invalid {} scheme '{}'. Only 'http' and 'https' are supported.",
            name,
            url.scheme()
        ));
    }

    if url.host().is_none() {
        return Err(format!("{} must include a host.", name));
    }

    if environment == "production" && url.scheme() == "http" {
        warn!("{} uses plain HTTP in production", name);
    }

    Ok(())
}
