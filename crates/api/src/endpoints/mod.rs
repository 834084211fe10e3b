//! API endpoints.

mod config;
mod migrate;
mod notifications;
mod reactions;
mod settings;

use axum::{
    Router,
    handler::Handler,
    http::StatusCode,
    routing::{MethodRouter, post},
};

use crate::middleware::AppState;
use crate::response::{ApiFailure, NOT_SENT_CORRECTLY};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/reactions",
        Router::new()
            .merge(reactions::router())
            .merge(config::router())
            .nest("/migrate", migrate::router())
            .nest("/settings", settings::router())
            .nest("/notifications", notifications::router()),
    )
}

/// A POST-only route. Other verbs get the malformed-request payload.
fn action<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).fallback(wrong_method)
}

async fn wrong_method() -> ApiFailure {
    ApiFailure::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        NOT_SENT_CORRECTLY,
    )
}
