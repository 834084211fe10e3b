//! Reaction endpoints.

use axum::{Router, extract::State};
use reactions_common::NonceAction;
use reactions_core::{AddOptions, PopularActivity, ReactionStates};
use serde::Deserialize;
use validator::Validate;

use super::action;
use crate::{
    extractors::{AuthUser, MaybeAuthUser, Payload},
    middleware::AppState,
    response::{ApiFailure, ApiResponse, ApiResult, NO_REACTIONS, SAVE_FAILED, UNKNOWN_ACTION},
};

/// Fetch reactions request.
#[derive(Debug, Deserialize, Validate)]
pub struct FetchRequest {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub nonce: String,
    pub activity_id: Option<i64>,
}

/// State of every registered reaction on an activity.
async fn fetch(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Payload(req): Payload<FetchRequest>,
) -> ApiResult<ReactionStates> {
    let viewer_id = viewer.id();
    state.verify_nonce(&req.nonce, NonceAction::Fetch, viewer_id)?;

    if state.reaction_service.registry().is_empty() {
        return Err(ApiFailure::bad_request(NO_REACTIONS));
    }

    let reactions = state
        .reaction_service
        .fetch(req.activity_id, viewer_id)
        .await?;
    Ok(ApiResponse::ok(reactions))
}

/// Save reaction request.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveRequest {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub nonce: String,
    #[serde(default)]
    pub activity_id: i64,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub reaction: String,
    #[serde(default = "default_doaction")]
    pub doaction: String,
}

fn default_doaction() -> String {
    "add".to_string()
}

/// Add or remove a reaction. Returns the affected reaction ID.
async fn save(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Payload(req): Payload<SaveRequest>,
) -> ApiResult<i64> {
    state.verify_nonce(&req.nonce, NonceAction::Save, user.id)?;

    if req.reaction.is_empty() || req.activity_id <= 0 {
        return Err(ApiFailure::bad_request(UNKNOWN_ACTION));
    }
    if state.reaction_service.registry().get(&req.reaction).is_none() {
        return Err(ApiFailure::bad_request(UNKNOWN_ACTION));
    }

    let result = if req.doaction == "add" {
        state
            .reaction_service
            .add(req.activity_id, &req.reaction, user.id, AddOptions::default())
            .await
    } else {
        state
            .reaction_service
            .remove(req.activity_id, &req.reaction, user.id)
            .await
    };

    match result {
        Ok(id) => Ok(ApiResponse::ok(id)),
        Err(e) => {
            if e.is_server_error() {
                tracing::error!(error = %e, activity_id = req.activity_id, "Saving reaction failed");
            } else {
                tracing::debug!(error = %e, activity_id = req.activity_id, "Reaction not saved");
            }
            Err(ApiFailure::bad_request(SAVE_FAILED))
        }
    }
}

/// Profile listing request.
#[derive(Debug, Deserialize, Validate)]
pub struct UserReactionsRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[validate(length(min = 1, max = 64))]
    pub scope: String,
}

/// Activities a user reacted to, for a profile scope.
async fn user_reactions(
    State(state): State<AppState>,
    Payload(req): Payload<UserReactionsRequest>,
) -> ApiResult<Vec<i64>> {
    let ids = state
        .reaction_service
        .user_scope(req.user_id, &req.scope)
        .await?;
    Ok(ApiResponse::ok(ids))
}

/// Popular activities request.
#[derive(Debug, Deserialize, Validate)]
pub struct PopularRequest {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Most reacted activities.
async fn popular(
    State(state): State<AppState>,
    Payload(req): Payload<PopularRequest>,
) -> ApiResult<Vec<PopularActivity>> {
    let popular = state
        .reaction_service
        .popular(req.limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(popular))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fetch", action(fetch))
        .route("/save", action(save))
        .route("/user", action(user_reactions))
        .route("/popular", action(popular))
}
