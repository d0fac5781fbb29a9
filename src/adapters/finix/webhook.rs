use {
    super::auth::{AuthOutcome, authenticate, verify_signature},
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::error::PipelineError,
        services::event_router::{IgnoreReason, RouteOutcome, route_event},
    },
    axum::{
        Json,
        body::{Body, to_bytes},
        extract::State,
        http::HeaderMap,
    },
};

/// Finix events are a few KB.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// `POST /webhook`. 401 when authentication fails, 200 for everything else,
/// including payloads we cannot use or will not read.
#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(event_type = tracing::field::Empty, object_id = tracing::field::Empty)
)]
pub async fn wh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<serde_json::Value>, ApiError> {
    tracing::info!("webhook received");

    // Fetched per request so credential changes apply immediately.
    let config = state.config.load().await.map_err(|e| {
        tracing::error!(error = %e, "gateway config unavailable, rejecting delivery");
        PipelineError::Unauthorized("gateway config unavailable".into())
    })?;

    match authenticate(&headers, &config) {
        Ok(AuthOutcome::Verified) => {}
        Ok(AuthOutcome::Unconfigured) => {
            tracing::debug!("processing delivery without credential check");
        }
        Err(e) => {
            tracing::warn!(error = %e, "webhook authentication failed");
            return Err(e.into());
        }
    }

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, limit = MAX_BODY_BYTES, "webhook body over limit or unreadable, ignoring");
            return Ok(respond(&RouteOutcome::Ignored(IgnoreReason::TooLarge)));
        }
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = verify_signature(&headers, &body, &config, now) {
        tracing::warn!(error = %e, "webhook signature rejected");
        return Err(e.into());
    }

    let outcome = route_event(&*state.orders, &*state.subscriptions, &body).await;
    if !matches!(outcome, RouteOutcome::Probe) {
        tracing::info!(bytes = body.len(), ?outcome, "webhook handled");
    }
    Ok(respond(&outcome))
}

fn respond(outcome: &RouteOutcome) -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": outcome.status()}))
}
