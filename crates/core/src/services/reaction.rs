//! Reaction service.
//!
//! Stores reactions as activity rows and keeps the per-activity reaction
//! count in the parent's metadata. Every change to the rows and the count
//! recompute happen in a single transaction that starts by locking the
//! parent activity, so writers on the same parent run one after another.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::services::observer::{ActivityDeleted, ObserverHandle, ReactionAdded, ReactionRemoved};
use crate::services::registry::{ReactionRegistry, ReactionType};
use chrono::{DateTime, FixedOffset, Utc};
use reactions_common::{AppError, AppResult};
use reactions_db::{
    entities::activity,
    repositories::{
        ActivityMetaRepository, ActivityRepository, REACTIONS_COMPONENT, UserRepository,
    },
};
use sea_orm::{ConnectionTrait, Set};
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Metadata key holding the denormalized reaction count.
pub const REACTIONS_COUNT_KEY: &str = "bp_reactions_count";

/// Profile scope listing every reaction of a user.
pub const ALL_REACTIONS_SCOPE: &str = "reactions";

/// Options for [`ReactionService::add`].
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Timestamp for the reaction row; now when unset.
    pub recorded_at: Option<DateTime<FixedOffset>>,
    /// Whether observers should tell the parent author.
    pub notify: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            recorded_at: None,
            notify: true,
        }
    }
}

/// Per-reaction state of an activity, as seen by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionState {
    pub reacted: bool,
    pub emoji: String,
    pub count: usize,
}

/// Reaction states keyed by reaction name, in registration order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionStates(Vec<(String, ReactionState)>);

impl ReactionStates {
    /// State of the reaction called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReactionState> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Reaction names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ReactionState)> for ReactionStates {
    fn from_iter<I: IntoIterator<Item = (String, ReactionState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ReactionStates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, state) in &self.0 {
            map.serialize_entry(name, state)?;
        }
        map.end()
    }
}

/// An activity in the popular listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularActivity {
    pub activity_id: i64,
    pub count: i64,
}

/// Build the permalink of an activity.
#[must_use]
pub fn activity_permalink(server_url: &str, activity_id: i64) -> String {
    format!(
        "{}/activity/p/{activity_id}/",
        server_url.trim_end_matches('/')
    )
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    registry: Arc<ReactionRegistry>,
    activity_repo: ActivityRepository,
    meta_repo: ActivityMetaRepository,
    user_repo: UserRepository,
    observers: Vec<ObserverHandle>,
    server_url: String,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(
        registry: Arc<ReactionRegistry>,
        activity_repo: ActivityRepository,
        meta_repo: ActivityMetaRepository,
        user_repo: UserRepository,
        server_url: String,
    ) -> Self {
        Self {
            registry,
            activity_repo,
            meta_repo,
            user_repo,
            observers: Vec::new(),
            server_url,
        }
    }

    /// Register an observer. Observers are called in registration order.
    pub fn add_observer(&mut self, observer: ObserverHandle) {
        self.observers.push(observer);
    }

    /// The registry this service validates reaction names against.
    #[must_use]
    pub fn registry(&self) -> &ReactionRegistry {
        &self.registry
    }

    /// Permalink of an activity on this site.
    #[must_use]
    pub fn permalink(&self, activity_id: i64) -> String {
        activity_permalink(&self.server_url, activity_id)
    }

    fn reaction(&self, name: &str) -> AppResult<&ReactionType> {
        self.registry
            .get(name)
            .ok_or_else(|| AppError::UnknownReaction(name.to_string()))
    }

    /// Add a reaction of `name` by `user_id` to `parent_id`.
    ///
    /// Adding a reaction that already exists returns the existing row's ID
    /// and changes nothing.
    pub async fn add(
        &self,
        parent_id: i64,
        name: &str,
        user_id: i64,
        options: AddOptions,
    ) -> AppResult<i64> {
        let reaction = self.reaction(name)?;

        let display_name = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map_or_else(|| "Someone".to_string(), |u| u.display_name);

        // Lock first: concurrent writers on one parent queue here, so the
        // count below always sees every committed row.
        let txn = self.activity_repo.begin().await?;
        if !self.activity_repo.lock(&txn, parent_id).await? {
            return Err(AppError::ActivityNotFound(parent_id));
        }

        let parent = self
            .activity_repo
            .find_by_id_in(&txn, parent_id)
            .await?
            .ok_or(AppError::ActivityNotFound(parent_id))?;

        if parent.component == REACTIONS_COMPONENT {
            return Err(AppError::BadRequest(
                "Reactions cannot be reacted to".to_string(),
            ));
        }

        let recorded_at = options
            .recorded_at
            .unwrap_or_else(|| Utc::now().fixed_offset());

        let model = activity::ActiveModel {
            user_id: Set(user_id),
            component: Set(REACTIONS_COMPONENT.to_string()),
            activity_type: Set(reaction.reaction_type.clone()),
            action: Set(reaction.format.render(&display_name)),
            content: Set(String::new()),
            primary_link: Set(self.permalink(parent_id)),
            item_id: Set(parent_id),
            secondary_item_id: Set(parent.user_id),
            hide_sitewide: Set(parent.hide_sitewide),
            date_recorded: Set(recorded_at),
            ..Default::default()
        };

        let (created, inserted) = self
            .activity_repo
            .insert_reaction(&txn, model, parent_id, &reaction.reaction_type, user_id)
            .await?;

        if !inserted {
            tracing::debug!(
                reaction_id = created.id,
                parent_id,
                user_id,
                "Reaction already exists"
            );
            return Ok(created.id);
        }

        let count = self.recompute_in(&txn, parent_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            reaction_id = created.id,
            reaction = %reaction.name,
            parent_id,
            user_id,
            count,
            "Reaction added"
        );

        let event = ReactionAdded {
            reaction_id: created.id,
            name: reaction.name.clone(),
            reaction_type: reaction.reaction_type.clone(),
            parent_id,
            parent_author_id: parent.user_id,
            user_id,
            notify: options.notify,
        };
        for observer in &self.observers {
            if let Err(e) = observer.reaction_added(&event).await {
                tracing::warn!(error = %e, reaction_id = created.id, "Reaction observer failed");
            }
        }

        Ok(created.id)
    }

    /// Remove the reaction of `name` by `user_id` from `parent_id`.
    ///
    /// Returns the ID of the deleted row.
    pub async fn remove(&self, parent_id: i64, name: &str, user_id: i64) -> AppResult<i64> {
        let reaction = self.reaction(name)?;

        let txn = self.activity_repo.begin().await?;
        self.activity_repo.lock(&txn, parent_id).await?;

        let row = self
            .activity_repo
            .find_reaction(&txn, parent_id, &reaction.reaction_type, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reaction not found".to_string()))?;

        self.activity_repo.delete(&txn, row.id).await?;
        let count = self.recompute_in(&txn, parent_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            reaction_id = row.id,
            reaction = %reaction.name,
            parent_id,
            user_id,
            count,
            "Reaction removed"
        );

        let event = ReactionRemoved {
            reaction_id: row.id,
            name: reaction.name.clone(),
            reaction_type: row.activity_type,
            parent_id,
            parent_author_id: row.secondary_item_id,
            user_id,
        };
        self.emit_removed(&event).await;

        Ok(row.id)
    }

    /// Delete an activity.
    ///
    /// Deleting a reaction row updates its parent's count. Deleting any other
    /// activity also deletes its reactions and metadata; those reaction rows
    /// are removed in bulk and never go through this method again.
    pub async fn delete_activity(&self, activity_id: i64) -> AppResult<()> {
        let row = self
            .activity_repo
            .find_by_id(activity_id)
            .await?
            .ok_or(AppError::ActivityNotFound(activity_id))?;

        let txn = self.activity_repo.begin().await?;

        if row.component == REACTIONS_COMPONENT {
            self.activity_repo.lock(&txn, row.item_id).await?;
            self.activity_repo.delete(&txn, row.id).await?;
            self.recompute_in(&txn, row.item_id).await?;
            txn.commit()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            tracing::info!(reaction_id = row.id, parent_id = row.item_id, "Reaction row deleted");

            let name = self
                .registry
                .get_by_type(&row.activity_type)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            let event = ReactionRemoved {
                reaction_id: row.id,
                name,
                reaction_type: row.activity_type,
                parent_id: row.item_id,
                parent_author_id: row.secondary_item_id,
                user_id: row.user_id,
            };
            self.emit_removed(&event).await;
            return Ok(());
        }

        self.activity_repo.lock(&txn, activity_id).await?;
        let reactions_removed = self
            .activity_repo
            .delete_reactions_of(&txn, activity_id)
            .await?;
        self.meta_repo.delete_all(&txn, activity_id).await?;
        self.activity_repo.delete(&txn, activity_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(activity_id, reactions_removed, "Activity deleted");

        let event = ActivityDeleted {
            activity_id,
            reactions_removed,
        };
        for observer in &self.observers {
            if let Err(e) = observer.activity_deleted(&event).await {
                tracing::warn!(error = %e, activity_id, "Reaction observer failed");
            }
        }

        Ok(())
    }

    async fn emit_removed(&self, event: &ReactionRemoved) {
        for observer in &self.observers {
            if let Err(e) = observer.reaction_removed(event).await {
                tracing::warn!(
                    error = %e,
                    reaction_id = event.reaction_id,
                    "Reaction observer failed"
                );
            }
        }
    }

    /// Recount the reactions of `parent_id` and store the result.
    pub async fn recompute(&self, parent_id: i64) -> AppResult<u64> {
        let txn = self.activity_repo.begin().await?;
        self.activity_repo.lock(&txn, parent_id).await?;
        let count = self.recompute_in(&txn, parent_id).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Recount on the given connection. A zero count deletes the key so the
    /// parent drops out of the popular listing.
    async fn recompute_in<C: ConnectionTrait>(&self, conn: &C, parent_id: i64) -> AppResult<u64> {
        let count = self.activity_repo.count_reactions(conn, parent_id).await?;

        if count == 0 {
            self.meta_repo
                .delete_key(conn, parent_id, REACTIONS_COUNT_KEY)
                .await?;
        } else {
            self.meta_repo
                .upsert(conn, parent_id, REACTIONS_COUNT_KEY, &count.to_string())
                .await?;
        }

        Ok(count)
    }

    /// The stored reaction count of an activity; `None` when it has none.
    pub async fn stored_count(&self, parent_id: i64) -> AppResult<Option<u64>> {
        Ok(self
            .meta_repo
            .get(parent_id, REACTIONS_COUNT_KEY)
            .await?
            .and_then(|v| v.parse().ok()))
    }

    /// Users who reacted to `parent_id`, grouped by reaction activity type.
    pub async fn list_reactors(&self, parent_id: i64) -> AppResult<BTreeMap<String, Vec<i64>>> {
        let rows = self.activity_repo.find_reactions(parent_id).await?;

        let mut reactors: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for row in rows {
            reactors.entry(row.activity_type).or_default().push(row.user_id);
        }

        Ok(reactors)
    }

    /// State of every registered reaction on `parent_id` for `viewer_id`,
    /// in registration order.
    ///
    /// Without an activity every reaction reports zero. Anonymous viewers
    /// use ID 0 and have never reacted.
    pub async fn fetch(
        &self,
        parent_id: Option<i64>,
        viewer_id: i64,
    ) -> AppResult<ReactionStates> {
        let reactors = match parent_id {
            Some(id) if id > 0 => self.list_reactors(id).await?,
            _ => BTreeMap::new(),
        };

        Ok(self
            .registry
            .list_all()
            .iter()
            .map(|r| {
                let users = reactors
                    .get(&r.reaction_type)
                    .map_or(&[][..], Vec::as_slice);
                let state = ReactionState {
                    reacted: viewer_id != 0 && users.contains(&viewer_id),
                    emoji: r.emoji.clone(),
                    count: users.len(),
                };
                (r.name.clone(), state)
            })
            .collect())
    }

    /// Distinct activity IDs `user_id` reacted to, optionally of one
    /// reaction activity type.
    pub async fn list_user_reactions(
        &self,
        user_id: i64,
        reaction_type: Option<&str>,
    ) -> AppResult<Vec<i64>> {
        if user_id <= 0 {
            return Ok(Vec::new());
        }

        self.activity_repo
            .find_reacted_parent_ids(user_id, reaction_type)
            .await
    }

    /// Activity IDs for a profile scope: `reactions` lists everything, a
    /// reaction name lists that reaction. Unknown scopes list nothing.
    pub async fn user_scope(&self, user_id: i64, scope: &str) -> AppResult<Vec<i64>> {
        if scope == ALL_REACTIONS_SCOPE {
            return self.list_user_reactions(user_id, None).await;
        }

        match self.registry.get(scope) {
            Some(reaction) => {
                self.list_user_reactions(user_id, Some(&reaction.reaction_type))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Activities ordered by reaction count, most reacted first.
    pub async fn popular(&self, limit: u64, offset: u64) -> AppResult<Vec<PopularActivity>> {
        Ok(self
            .meta_repo
            .ranked_by_numeric_value(REACTIONS_COUNT_KEY, limit, offset)
            .await?
            .into_iter()
            .map(|(activity_id, count)| PopularActivity { activity_id, count })
            .collect())
    }
}
