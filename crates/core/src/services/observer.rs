//! Reaction observers.
//!
//! Side effects of reaction changes (notifications, cache busting, ...) are
//! registered explicitly on the reaction service instead of being hooked in
//! implicitly. Observers run after the change is committed.

use async_trait::async_trait;
use reactions_common::AppResult;
use std::sync::Arc;

/// A reaction row was inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionAdded {
    /// ID of the reaction row.
    pub reaction_id: i64,
    /// Reaction name.
    pub name: String,
    /// Activity type of the reaction row.
    pub reaction_type: String,
    /// The reacted activity.
    pub parent_id: i64,
    /// Author of the reacted activity.
    pub parent_author_id: i64,
    /// The reacting user.
    pub user_id: i64,
    /// Whether the author should be told.
    pub notify: bool,
}

/// A reaction row was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionRemoved {
    pub reaction_id: i64,
    pub name: String,
    pub reaction_type: String,
    pub parent_id: i64,
    pub parent_author_id: i64,
    pub user_id: i64,
}

/// A non-reaction activity and its reactions were deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDeleted {
    pub activity_id: i64,
    /// Number of reaction rows removed with it.
    pub reactions_removed: u64,
}

/// Receives reaction lifecycle events.
///
/// Errors are logged by the caller and never undo the change.
#[async_trait]
pub trait ReactionObserver: Send + Sync {
    /// Called after a reaction was added.
    async fn reaction_added(&self, event: &ReactionAdded) -> AppResult<()>;

    /// Called after a reaction was removed.
    async fn reaction_removed(&self, event: &ReactionRemoved) -> AppResult<()>;

    /// Called after an activity was deleted together with its reactions.
    async fn activity_deleted(&self, event: &ActivityDeleted) -> AppResult<()>;
}

/// Type alias for a shared observer.
pub type ObserverHandle = Arc<dyn ReactionObserver>;
