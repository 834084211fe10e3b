//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use reactions_common::{NonceAction, NonceSigner};
use reactions_core::{
    EmojiCatalog, MigrationService, NotificationService, ReactionService, SettingsService,
};
use reactions_db::repositories::UserRepository;

use crate::response::ApiFailure;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub reaction_service: ReactionService,
    pub notification_service: Arc<NotificationService>,
    pub settings_service: SettingsService,
    pub migration_service: MigrationService,
    pub user_repo: UserRepository,
    pub nonces: NonceSigner,
    pub emojis: Arc<EmojiCatalog>,
    pub server_url: String,
}

impl AppState {
    /// Reject the request unless `nonce` was issued for `action` and `user_id`.
    pub fn verify_nonce(
        &self,
        nonce: &str,
        action: NonceAction,
        user_id: i64,
    ) -> Result<(), ApiFailure> {
        if !nonce.is_empty() && self.nonces.verify(nonce, action, user_id) {
            return Ok(());
        }

        tracing::debug!(action = action.as_str(), user_id, "Nonce rejected");
        Err(ApiFailure::not_allowed())
    }
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stores it in the request
/// extensions. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned);

    if let Some(token) = token {
        match state.user_repo.find_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown API token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
