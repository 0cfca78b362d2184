//! # StreamRelay Server
//!
//! Gateway host process: configuration, router, listener and graceful
//! shutdown.

use stream_relay::{create_router, AppState, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI args and .env file
    let config = Config::parse_args();

    let addr = config.bind_address();

    let state = AppState::new(config.clone())?;
    let app = create_router(state);

    info!("🚀 StreamRelay gateway starting on http://{}", addr);
    info!("Environment: {}", config.environment);
    info!("Anthropic endpoint: {}", config.anthropic_base_url);
    info!("Groq endpoint: {}", config.groq_base_url);

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("StreamRelay gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
