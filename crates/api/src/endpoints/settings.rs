//! Settings endpoints.

use axum::{Router, extract::State};
use reactions_core::ReactionSettings;
use serde::Deserialize;
use validator::Validate;

use super::action;
use crate::{
    extractors::{AdminUser, EmptyRequest, Payload},
    middleware::AppState,
    response::{ApiResponse, ApiResult},
};

/// Current settings.
async fn show(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Payload(_): Payload<EmptyRequest>,
) -> ApiResult<ReactionSettings> {
    Ok(ApiResponse::ok(state.settings_service.get().await?))
}

/// Update settings request. Missing fields are left as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    pub unique_subnav: Option<bool>,
    pub disable_replace_favorites: Option<bool>,
}

/// Change settings.
async fn update(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Payload(req): Payload<UpdateSettingsRequest>,
) -> ApiResult<ReactionSettings> {
    let settings = state
        .settings_service
        .update(req.unique_subnav, req.disable_replace_favorites)
        .await?;

    tracing::info!(admin_id = admin.id, "Settings changed");
    Ok(ApiResponse::ok(settings))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", action(show))
        .route("/update", action(update))
}
