//! # Server Handlers
//!
//! HTTP route handlers for the gateway.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    Json,
};
use futures_util::{future, stream, StreamExt};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::{
    adapters::AdapterTrait,
    error::GatewayError,
    schemas::{CompletionRequest, GenerateBody, Provider, UniformEvent},
    streaming::create_streaming_response,
};

/// Completion handler
///
/// Validates the request and the provider credential, opens the upstream
/// stream and relays it as `text/event-stream`. An upstream failure that
/// arrives before the first event is reported as `502`; anything later is
/// reported in-stream.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(body) = body.map_err(|rejection| {
        GatewayError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let request = CompletionRequest::try_from(body)?;

    let credential = state
        .credentials()
        .get(request.provider)
        .ok_or_else(|| {
            GatewayError::Configuration(format!(
                "{} is not configured",
                request.provider.credential_env()
            ))
        })?
        .clone();

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "generate",
        request_id = %request_id,
        provider = %request.provider,
        model = %request.model
    );

    async move {
        info!(prompt_len = request.prompt.len(), "dispatching completion");

        let adapter = state.adapters().get(request.provider);
        let mut events = adapter
            .open_stream(&request.model, &request.prompt, &credential)
            .await;

        let first = match events.next().await {
            Some(UniformEvent::Failure { message }) => {
                warn!(error = %message, "upstream failed before streaming");
                return Err(GatewayError::Upstream(message));
            }
            Some(event) => event,
            None => {
                warn!("upstream stream ended without any event");
                return Err(GatewayError::Upstream(format!(
                    "{} closed the stream without a response",
                    adapter.name()
                )));
            }
        };

        let events = stream::once(future::ready(first)).chain(events).boxed();
        create_streaming_response(events, request_id)
    }
    .instrument(span)
    .await
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let credentials = state.credentials();
    let health_status = serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "stream-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": {
            "anthropic": credentials.is_configured(Provider::Anthropic),
            "groq": credentials.is_configured(Provider::Groq),
        }
    });

    (StatusCode::OK, JsonResponse(health_status))
}
