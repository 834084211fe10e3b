//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reactions_common::AppError;
use serde::Serialize;

/// Wrong verb or malformed body.
pub const NOT_SENT_CORRECTLY: &str = "The action was not sent correctly.";

/// Bad nonce, missing login or missing privilege.
pub const NOT_ALLOWED: &str = "You are not allowed to perform this action.";

/// Fetch with an empty registry.
pub const NO_REACTIONS: &str = "No registered reactions.";

/// Save with a missing or unregistered reaction.
pub const UNKNOWN_ACTION: &str = "Oops unknown action.";

/// Save that did not go through.
pub const SAVE_FAILED: &str = "Saving the reaction failed.";

/// Migration step that did not go through.
pub const TASK_FAILED: &str = "The task could not process due to an error";

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// API error body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A failed API call.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub error: ApiError,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    error: &'a ApiError,
}

impl ApiFailure {
    /// Create a failure.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError {
                code: code.into(),
                message: message.into(),
                id: None,
            },
        }
    }

    /// Attach the ID of the object the failure is about.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.error.id = Some(id.into());
        self
    }

    /// Wrong verb or malformed body.
    #[must_use]
    pub fn not_sent_correctly() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", NOT_SENT_CORRECTLY)
    }

    /// Authorization failure.
    #[must_use]
    pub fn not_allowed() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", NOT_ALLOWED)
    }

    /// A request that could not be honored.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

impl From<AppError> for ApiFailure {
    fn from(err: AppError) -> Self {
        if err.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Server error occurred");
        } else {
            tracing::debug!(error = %err, code = err.error_code(), "Client error occurred");
        }

        match err {
            AppError::Unauthorized | AppError::Forbidden(_) => Self::not_allowed(),
            AppError::Validation(_) => Self::not_sent_correctly(),
            other => Self::new(other.status_code(), other.error_code(), other.to_string()),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(FailureBody { error: &self.error })).into_response()
    }
}

/// Handler result type.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiFailure>;
