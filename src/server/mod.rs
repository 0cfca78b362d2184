//! # Server Module
//!
//! Router, handlers and shared state for the gateway HTTP surface.

pub mod handlers;
pub mod state;

pub use handlers::{generate, health_check};
pub use state::AppState;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{self, TraceLayer},
};
use tracing::{warn, Level};

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origin);

    Router::new()
        // Streaming completion endpoint
        .route("/api/generate", post(generate))

        // Health check for production monitoring
        .route("/health", get(health_check))

        .layer(
            ServiceBuilder::new()
                // Tracing middleware - logs HTTP requests and responses
                .layer(TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)))

                .layer(cors),
        )
        .with_state(state)
}

/// `*` allows any origin; anything else is taken as the single allowed origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
        Err(err) => {
            warn!(origin, error = %err, "invalid CORS origin, cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}
