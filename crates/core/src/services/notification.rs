//! Reaction notifications.
//!
//! Tells activity authors when someone reacts to their activities. Runs as a
//! [`ReactionObserver`] on the reaction service.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::services::observer::{ActivityDeleted, ReactionAdded, ReactionObserver, ReactionRemoved};
use crate::services::reaction::activity_permalink;
use crate::services::registry::ReactionRegistry;
use async_trait::async_trait;
use chrono::Utc;
use reactions_common::AppResult;
use reactions_db::{
    entities::notification,
    repositories::{NotificationRepository, REACTIONS_COMPONENT, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// A user-facing notification, grouped by activity and reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedNotification {
    /// The reacted activity.
    pub item_id: i64,
    /// Reaction activity type.
    pub action: String,
    /// Unread notifications folded into this one.
    pub total_items: usize,
    pub text: String,
    pub link: String,
}

/// Notification service for reactions.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    registry: Arc<ReactionRegistry>,
    server_url: String,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        user_repo: UserRepository,
        registry: Arc<ReactionRegistry>,
        server_url: String,
    ) -> Self {
        Self {
            notification_repo,
            user_repo,
            registry,
            server_url,
        }
    }

    /// Unread reaction notifications of a user, newest first.
    ///
    /// Notifications about the same activity and reaction are folded into
    /// one entry.
    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<FormattedNotification>> {
        let rows = self
            .notification_repo
            .find_unread_by_user(user_id, REACTIONS_COMPONENT)
            .await?;

        // (item, action) -> (reactors, first seen position)
        let mut groups: BTreeMap<(i64, String), (Vec<i64>, usize)> = BTreeMap::new();
        for (pos, row) in rows.into_iter().enumerate() {
            groups
                .entry((row.item_id, row.component_action))
                .or_insert_with(|| (Vec::new(), pos))
                .0
                .push(row.secondary_item_id);
        }

        let mut ordered: Vec<_> = groups.into_iter().collect();
        ordered.sort_by_key(|(_, (_, pos))| *pos);

        let mut formatted = Vec::with_capacity(ordered.len());
        for ((item_id, action), (reactors, _)) in ordered {
            let reactor_name = match reactors.first() {
                Some(&id) if reactors.len() == 1 => self
                    .user_repo
                    .find_by_id(id)
                    .await?
                    .map(|u| u.display_name),
                _ => None,
            };

            if let Some(n) = self.format(&action, item_id, reactors.len(), reactor_name.as_deref()) {
                formatted.push(n);
            }
        }

        Ok(formatted)
    }

    /// Render one notification. Returns `None` for unregistered reactions.
    #[must_use]
    pub fn format(
        &self,
        action: &str,
        item_id: i64,
        total_items: usize,
        reactor_name: Option<&str>,
    ) -> Option<FormattedNotification> {
        let reaction = self.registry.get_by_type(action)?;

        let (text, link) = if total_items > 1 {
            let text = reaction
                .notification_texts
                .plural
                .clone()
                .unwrap_or_else(|| "Some users reacted to one of your activities".to_string());
            let link = format!(
                "{}/notifications/?type={action}",
                self.server_url.trim_end_matches('/')
            );
            (text, link)
        } else {
            let name = reactor_name.unwrap_or("Someone");
            let text = reaction.notification_texts.singular.as_ref().map_or_else(
                || format!("{name} reacted to one of your activities"),
                |t| t.replacen("%s", name, 1),
            );
            let link = format!(
                "{}?reaction=read",
                activity_permalink(&self.server_url, item_id)
            );
            (text, link)
        };

        Some(FormattedNotification {
            item_id,
            action: action.to_string(),
            total_items,
            text,
            link,
        })
    }

    /// Mark a user's notifications about an activity as read.
    pub async fn mark_read(&self, user_id: i64, item_id: i64) -> AppResult<u64> {
        self.notification_repo
            .mark_read_by_item(user_id, REACTIONS_COMPONENT, item_id)
            .await
    }
}

#[async_trait]
impl ReactionObserver for NotificationService {
    async fn reaction_added(&self, event: &ReactionAdded) -> AppResult<()> {
        if !event.notify || event.parent_author_id <= 0 || event.user_id == event.parent_author_id
        {
            return Ok(());
        }

        let model = notification::ActiveModel {
            user_id: Set(event.parent_author_id),
            item_id: Set(event.parent_id),
            secondary_item_id: Set(event.user_id),
            component_name: Set(REACTIONS_COMPONENT.to_string()),
            component_action: Set(event.reaction_type.clone()),
            date_notified: Set(Utc::now().into()),
            is_new: Set(true),
            ..Default::default()
        };
        self.notification_repo.create(model).await?;

        tracing::debug!(
            recipient = event.parent_author_id,
            parent_id = event.parent_id,
            "Reaction notification created"
        );
        Ok(())
    }

    async fn reaction_removed(&self, event: &ReactionRemoved) -> AppResult<()> {
        self.notification_repo
            .delete_for_reaction(
                REACTIONS_COMPONENT,
                event.parent_id,
                event.user_id,
                &event.reaction_type,
            )
            .await?;
        Ok(())
    }

    async fn activity_deleted(&self, event: &ActivityDeleted) -> AppResult<()> {
        self.notification_repo
            .delete_by_item(REACTIONS_COMPONENT, event.activity_id)
            .await?;
        Ok(())
    }
}
