//! Reaction registry.
//!
//! Reaction types are registered once at startup and are immutable
//! afterwards. The registry is built explicitly and shared by reference with
//! the services and handlers that need it.

use reactions_common::config::CustomReactionConfig;
use serde::{Deserialize, Serialize};

/// Prefix of the activity type stored for each reaction.
pub const REACTION_TYPE_PREFIX: &str = "bp_activity_reaction_";

/// Name of the built-in reaction that replaces favorites.
pub const FAVORITE: &str = "favorite";

/// Name of the built-in like reaction.
pub const LIKE: &str = "like";

/// How the action string of a reaction row is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFormat {
    /// "{name} reacted to an update"
    #[default]
    Default,
    /// "{name} favorited an update"
    Favorite,
    /// "{name} liked an update"
    Like,
}

impl ActionFormat {
    /// Render the action string for the acting user.
    #[must_use]
    pub fn render(self, display_name: &str) -> String {
        match self {
            Self::Default => format!("{display_name} reacted to an update"),
            Self::Favorite => format!("{display_name} favorited an update"),
            Self::Like => format!("{display_name} liked an update"),
        }
    }

    /// Parse a format name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "favorite" => Some(Self::Favorite),
            "like" => Some(Self::Like),
            _ => None,
        }
    }
}

/// Custom notification texts of a reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTexts {
    /// Text for a single reactor; `%s` is replaced by the reactor's name.
    pub singular: Option<String>,
    /// Text for several reactors.
    pub plural: Option<String>,
}

/// Arguments to [`ReactionRegistry::register`].
#[derive(Debug, Clone, Default)]
pub struct ReactionConfig {
    pub emoji: String,
    pub label: String,
    pub description: String,
    pub can_comment: bool,
    pub position: i32,
    pub format: ActionFormat,
    pub notification_texts: NotificationTexts,
}

impl ReactionConfig {
    /// A config with just an emoji; everything else defaulted.
    #[must_use]
    pub fn new(emoji: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn format(mut self, format: ActionFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub const fn can_comment(mut self, can_comment: bool) -> Self {
        self.can_comment = can_comment;
        self
    }
}

impl From<&CustomReactionConfig> for ReactionConfig {
    fn from(c: &CustomReactionConfig) -> Self {
        Self {
            emoji: c.emoji.clone(),
            label: c.label.clone(),
            description: c.description.clone(),
            can_comment: c.can_comment,
            position: c.position,
            format: c
                .format
                .as_deref()
                .and_then(ActionFormat::parse)
                .unwrap_or_default(),
            notification_texts: NotificationTexts {
                singular: c.notification_singular.clone(),
                plural: c.notification_plural.clone(),
            },
        }
    }
}

/// A registered reaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionType {
    /// Sanitized unique name.
    pub name: String,
    /// Activity type of the rows recording this reaction.
    pub reaction_type: String,
    pub emoji: String,
    pub label: String,
    pub description: String,
    pub can_comment: bool,
    pub position: i32,
    pub format: ActionFormat,
    pub notification_texts: NotificationTexts,
}

/// Settings that change which built-in reactions exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Keep the platform's own favorites instead of the `favorite` reaction.
    pub disable_replace_favorites: bool,
}

/// Append-only set of reaction types, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ReactionRegistry {
    reactions: Vec<ReactionType>,
}

impl ReactionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reactions: Vec::new(),
        }
    }

    /// Create a registry holding the built-in reactions.
    ///
    /// `favorite` is registered unless favorites replacement is disabled,
    /// then `like`.
    #[must_use]
    pub fn with_defaults(options: RegistryOptions) -> Self {
        let mut registry = Self::new();

        if !options.disable_replace_favorites {
            registry.register(
                FAVORITE,
                ReactionConfig::new("0x2B50")
                    .label("Favorites")
                    .description("Favorited an update")
                    .format(ActionFormat::Favorite),
            );
        }

        registry.register(
            LIKE,
            ReactionConfig::new("0x2764")
                .label("Likes")
                .description("Liked an update")
                .format(ActionFormat::Like),
        );

        registry
    }

    /// Register the configured extra reactions, after the existing ones.
    pub fn register_custom(&mut self, custom: &[CustomReactionConfig]) {
        for c in custom {
            if !self.register(&c.name, ReactionConfig::from(c)) {
                tracing::warn!(name = %c.name, "Ignoring invalid or duplicate reaction");
            }
        }
    }

    /// Register a reaction type.
    ///
    /// Returns `false`, leaving the registry untouched, when the name is empty
    /// after sanitizing, the emoji is missing, or the name is taken.
    pub fn register(&mut self, name: &str, config: ReactionConfig) -> bool {
        let name = sanitize_name(name);

        if name.is_empty() || config.emoji.trim().is_empty() || self.get(&name).is_some() {
            return false;
        }

        tracing::debug!(name = %name, emoji = %config.emoji, "Registered reaction");

        self.reactions.push(ReactionType {
            reaction_type: format!("{REACTION_TYPE_PREFIX}{name}"),
            name,
            emoji: config.emoji,
            label: config.label,
            description: config.description,
            can_comment: config.can_comment,
            position: config.position,
            format: config.format,
            notification_texts: config.notification_texts,
        });

        true
    }

    /// Look up a reaction by its exact registered name.
    ///
    /// Names are sanitized on registration only; `LIKE` or `l!ike` do not
    /// name the `like` reaction.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReactionType> {
        self.reactions.iter().find(|r| r.name == name)
    }

    /// Look up a reaction by its activity type.
    #[must_use]
    pub fn get_by_type(&self, reaction_type: &str) -> Option<&ReactionType> {
        self.reactions
            .iter()
            .find(|r| r.reaction_type == reaction_type)
    }

    /// All reactions, in registration order.
    #[must_use]
    pub fn list_all(&self) -> &[ReactionType] {
        &self.reactions
    }

    /// All reactions ordered by position; ties keep registration order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&ReactionType> {
        let mut sorted: Vec<_> = self.reactions.iter().collect();
        sorted.sort_by_key(|r| r.position);
        sorted
    }

    /// Whether activities of `activity_type` accept comments.
    ///
    /// Reaction rows follow their reaction's setting; anything else can be
    /// commented on.
    #[must_use]
    pub fn can_comment(&self, activity_type: &str) -> bool {
        self.get_by_type(activity_type)
            .is_none_or(|r| r.can_comment)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reactions.len()
    }
}

/// Lowercase and keep only `[a-z0-9_-]`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}
