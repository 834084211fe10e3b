//! Front-end configuration and profile navigation.

use axum::{Router, extract::State};
use reactions_common::NonceAction;
use reactions_core::{Emoji, SubnavItem, profile_subnav};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::action;
use crate::{
    extractors::{EmptyRequest, MaybeAuthUser, Payload},
    middleware::AppState,
    response::{ApiResponse, ApiResult},
};

/// A registered reaction as shown to the front end.
#[derive(Debug, Serialize)]
pub struct ReactionInfo {
    pub name: String,
    pub emoji: String,
    pub label: String,
    pub description: String,
    pub can_comment: bool,
}

/// Everything the front end needs to render reactions.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub logged_in: bool,
    pub fetch_nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_nonce: Option<String>,
    pub reactions: Vec<ReactionInfo>,
    pub emojis: Vec<Emoji>,
}

/// Nonces, labels and emojis for the current viewer.
async fn config(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Payload(_): Payload<EmptyRequest>,
) -> ApiResult<ConfigResponse> {
    let viewer_id = viewer.id();
    let is_admin = viewer.0.as_ref().is_some_and(|u| u.is_admin);

    let reactions = state
        .reaction_service
        .registry()
        .sorted()
        .into_iter()
        .map(|r| ReactionInfo {
            name: r.name.clone(),
            emoji: r.emoji.clone(),
            label: r.label.clone(),
            description: r.description.clone(),
            can_comment: r.can_comment,
        })
        .collect();

    Ok(ApiResponse::ok(ConfigResponse {
        logged_in: viewer.0.is_some(),
        fetch_nonce: state.nonces.create(NonceAction::Fetch, viewer_id),
        save_nonce: viewer
            .0
            .is_some()
            .then(|| state.nonces.create(NonceAction::Save, viewer_id)),
        migrate_nonce: is_admin.then(|| state.nonces.create(NonceAction::Migrate, viewer_id)),
        reactions,
        emojis: state.emojis.all().to_vec(),
    }))
}

/// Profile navigation request.
#[derive(Debug, Deserialize, Validate)]
pub struct NavRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
}

/// Reaction tabs of a user's profile.
async fn nav(
    State(state): State<AppState>,
    Payload(req): Payload<NavRequest>,
) -> ApiResult<Vec<SubnavItem>> {
    let user = state.user_repo.get_by_id(req.user_id).await?;
    let settings = state.settings_service.get().await?;

    let profile_url = format!(
        "{}/members/{}/activity",
        state.server_url.trim_end_matches('/'),
        user.login
    );
    let items = profile_subnav(state.reaction_service.registry(), settings, &profile_url);

    Ok(ApiResponse::ok(items))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", action(config))
        .route("/nav", action(nav))
}
