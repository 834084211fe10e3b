//! Reaction settings and profile navigation.

use crate::services::reaction::ALL_REACTIONS_SCOPE;
use crate::services::registry::{ReactionRegistry, RegistryOptions};
use reactions_common::AppResult;
use reactions_db::repositories::SiteOptionRepository;
use serde::{Deserialize, Serialize};

/// Option holding the unique-subnav toggle.
pub const UNIQUE_SUBNAV_OPTION: &str = "_bp_reactions_use_unique_subnav";

/// Option holding the favorites-override toggle.
pub const DISABLE_REPLACE_FAVORITES_OPTION: &str = "_bp_reactions_disable_replace_favorites";

/// Position of the first reactions entry in the profile navigation.
const SUBNAV_POSITION: i32 = 30;

/// Stored reaction settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSettings {
    /// Group every reaction under one "Reactions" profile tab.
    pub unique_subnav: bool,
    /// Keep the platform's favorites instead of the `favorite` reaction.
    pub disable_replace_favorites: bool,
}

impl From<ReactionSettings> for RegistryOptions {
    fn from(settings: ReactionSettings) -> Self {
        Self {
            disable_replace_favorites: settings.disable_replace_favorites,
        }
    }
}

/// A profile navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnavItem {
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub css_id: String,
    pub link: String,
}

/// Settings service.
#[derive(Clone)]
pub struct SettingsService {
    option_repo: SiteOptionRepository,
}

impl SettingsService {
    /// Create a new settings service.
    #[must_use]
    pub const fn new(option_repo: SiteOptionRepository) -> Self {
        Self { option_repo }
    }

    /// Read the stored settings. Missing options are off.
    pub async fn get(&self) -> AppResult<ReactionSettings> {
        Ok(ReactionSettings {
            unique_subnav: self.flag(UNIQUE_SUBNAV_OPTION).await?,
            disable_replace_favorites: self.flag(DISABLE_REPLACE_FAVORITES_OPTION).await?,
        })
    }

    /// Change the given settings and return the result.
    ///
    /// Toggling favorites replacement takes effect on the next start, since
    /// the registry is fixed once built.
    pub async fn update(
        &self,
        unique_subnav: Option<bool>,
        disable_replace_favorites: Option<bool>,
    ) -> AppResult<ReactionSettings> {
        if let Some(v) = unique_subnav {
            self.set_flag(UNIQUE_SUBNAV_OPTION, v).await?;
        }
        if let Some(v) = disable_replace_favorites {
            self.set_flag(DISABLE_REPLACE_FAVORITES_OPTION, v).await?;
        }

        let settings = self.get().await?;
        tracing::info!(?settings, "Reaction settings updated");
        Ok(settings)
    }

    async fn flag(&self, name: &str) -> AppResult<bool> {
        Ok(self
            .option_repo
            .get(name)
            .await?
            .is_some_and(|v| v.trim().parse::<i64>().is_ok_and(|n| n != 0)))
    }

    async fn set_flag(&self, name: &str, value: bool) -> AppResult<()> {
        self.option_repo
            .set(name, if value { "1" } else { "0" })
            .await
    }
}

/// Profile navigation entries for the reactions tabs.
///
/// `profile_url` is the activity section of the displayed user's profile.
#[must_use]
pub fn profile_subnav(
    registry: &ReactionRegistry,
    settings: ReactionSettings,
    profile_url: &str,
) -> Vec<SubnavItem> {
    let base = profile_url.trim_end_matches('/');

    if settings.unique_subnav {
        return vec![SubnavItem {
            name: "Reactions".to_string(),
            slug: ALL_REACTIONS_SCOPE.to_string(),
            position: SUBNAV_POSITION,
            css_id: "activity-reactions".to_string(),
            link: format!("{base}/{ALL_REACTIONS_SCOPE}/"),
        }];
    }

    registry
        .list_all()
        .iter()
        .zip(SUBNAV_POSITION..)
        .map(|(r, position)| SubnavItem {
            name: r.label.clone(),
            slug: r.name.clone(),
            position,
            css_id: format!("activity-{}", r.name),
            link: format!("{base}/{}/", r.name),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reactions_db::test_utils::TestDatabase;

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let db = TestDatabase::new().await.unwrap();
        let svc = SettingsService::new(SiteOptionRepository::new(db.connection()));

        assert_eq!(svc.get().await.unwrap(), ReactionSettings::default());

        let updated = svc.update(Some(true), None).await.unwrap();
        assert!(updated.unique_subnav);
        assert!(!updated.disable_replace_favorites);

        let updated = svc.update(Some(false), Some(true)).await.unwrap();
        assert!(!updated.unique_subnav);
        assert!(updated.disable_replace_favorites);

        let options: RegistryOptions = updated.into();
        assert!(options.disable_replace_favorites);
    }

    #[tokio::test]
    async fn test_non_numeric_option_is_off() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SiteOptionRepository::new(db.connection());
        repo.set(UNIQUE_SUBNAV_OPTION, "yes").await.unwrap();

        let svc = SettingsService::new(repo);
        assert!(!svc.get().await.unwrap().unique_subnav);
    }

    #[test]
    fn test_subnav_per_reaction() {
        let registry = ReactionRegistry::with_defaults(RegistryOptions::default());
        let items = profile_subnav(
            &registry,
            ReactionSettings::default(),
            "https://example.com/members/alice/activity/",
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Favorites");
        assert_eq!(items[0].position, 30);
        assert_eq!(items[1].slug, "like");
        assert_eq!(items[1].position, 31);
        assert_eq!(items[1].css_id, "activity-like");
        assert_eq!(
            items[1].link,
            "https://example.com/members/alice/activity/like/"
        );
    }

    #[test]
    fn test_unique_subnav() {
        let registry = ReactionRegistry::with_defaults(RegistryOptions::default());
        let items = profile_subnav(
            &registry,
            ReactionSettings {
                unique_subnav: true,
                disable_replace_favorites: false,
            },
            "https://example.com/members/alice/activity",
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "reactions");
        assert_eq!(items[0].css_id, "activity-reactions");
    }
}
