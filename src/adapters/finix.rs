pub mod auth;
pub mod signature;
pub mod webhook;

use {
    crate::AppState,
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::StatusCode,
        routing::{get, post},
    },
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/webhook", post(webhook::wh_handler))
        // The handler enforces its own limit after authentication.
        .layer(DefaultBodyLimit::disable())
        // Finix retries any non-2xx, so a timed-out delivery is still acknowledged.
        .layer(TimeoutLayer::with_status_code(StatusCode::OK, REQUEST_TIMEOUT))
        .with_state(state)
}
