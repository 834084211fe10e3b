//! Notification endpoints.

use axum::{Router, extract::State};
use reactions_core::FormattedNotification;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::action;
use crate::{
    extractors::{AuthUser, EmptyRequest, Payload},
    middleware::AppState,
    response::{ApiResponse, ApiResult},
};

/// Unread reaction notifications of the current user.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Payload(_): Payload<EmptyRequest>,
) -> ApiResult<Vec<FormattedNotification>> {
    let notifications = state.notification_service.list_for_user(user.id).await?;
    Ok(ApiResponse::ok(notifications))
}

/// Mark read request.
#[derive(Debug, Deserialize, Validate)]
pub struct MarkReadRequest {
    #[validate(range(min = 1))]
    pub activity_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Mark the notifications about an activity as read.
async fn read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Payload(req): Payload<MarkReadRequest>,
) -> ApiResult<MarkReadResponse> {
    let updated = state
        .notification_service
        .mark_read(user.id, req.activity_id)
        .await?;
    Ok(ApiResponse::ok(MarkReadResponse { updated }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", action(list))
        .route("/read", action(read))
}
