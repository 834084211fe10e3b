//! Favorites migration endpoints.
//!
//! The admin screen drives the migration one page at a time: it posts a
//! step, adds the returned count to its `done` total and posts the next step
//! until the task is complete.

use axum::{Router, extract::State, http::StatusCode};
use reactions_common::NonceAction;
use reactions_core::{MigrationTask, StepExecutor, TaskDescriptor};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::action;
use crate::{
    extractors::{AdminUser, EmptyRequest, MaybeAuthUser, Payload},
    middleware::AppState,
    response::{ApiFailure, ApiResponse, ApiResult, TASK_FAILED},
};

/// Migration step request.
#[derive(Debug, Deserialize, Validate)]
pub struct MigrateRequest {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub nonce: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub id: String,
    pub count: Option<u64>,
    pub done: Option<u64>,
    pub step: Option<u64>,
    pub number: Option<u64>,
}

/// Migration step result.
#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    /// Legacy rows read by this step.
    pub done: u64,
    /// The task that ran.
    pub callback: String,
}

fn task_failed(status: StatusCode) -> ApiFailure {
    ApiFailure::new(status, "TASK_FAILED", TASK_FAILED)
}

/// Run one page of a migration task.
async fn migrate(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Payload(req): Payload<MigrateRequest>,
) -> ApiResult<MigrateResponse> {
    let (Some(count), Some(done), Some(step)) = (req.count, req.done, req.step) else {
        return Err(task_failed(StatusCode::BAD_REQUEST));
    };
    if req.id.is_empty() {
        return Err(task_failed(StatusCode::BAD_REQUEST));
    }

    let callback = req.id.clone();
    let fail = |status| task_failed(status).with_id(callback.clone());

    let user = viewer.0.ok_or_else(|| fail(StatusCode::FORBIDDEN))?;
    state
        .verify_nonce(&req.nonce, NonceAction::Migrate, user.id)
        .map_err(|_| fail(StatusCode::FORBIDDEN))?;
    if !user.is_admin {
        return Err(fail(StatusCode::FORBIDDEN));
    }

    let task: MigrationTask = req.id.parse().map_err(|_| fail(StatusCode::BAD_REQUEST))?;
    let number = req.number.filter(|n| *n > 0).unwrap_or(1);

    tracing::debug!(task = task.id(), count, done, step, number, "Migration step requested");

    let processed = state
        .migration_service
        .run_step(task, step, number)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, task = task.id(), step, "Migration step failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    Ok(ApiResponse::ok(MigrateResponse {
        done: processed,
        callback,
    }))
}

/// The migration tasks with their current legacy row counts.
async fn tasks(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Payload(_): Payload<EmptyRequest>,
) -> ApiResult<Vec<TaskDescriptor>> {
    let tasks = state.migration_service.tasks().await?;
    Ok(ApiResponse::ok(tasks))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", action(migrate))
        .route("/tasks", action(tasks))
}
