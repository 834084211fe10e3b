//! Business logic services.

#![allow(missing_docs)]

pub mod emoji;
pub mod migration;
pub mod notification;
pub mod observer;
pub mod reaction;
pub mod registry;
pub mod settings;

pub use emoji::{Emoji, EmojiCatalog};
pub use migration::{
    LEGACY_FAVORITES_KEY, MigrationRunner, MigrationService, MigrationTask, QueuedTask,
    StepExecutor, TaskDescriptor, TaskQueue, TaskState,
};
pub use notification::{FormattedNotification, NotificationService};
pub use observer::{ActivityDeleted, ObserverHandle, ReactionAdded, ReactionObserver, ReactionRemoved};
pub use reaction::{
    ALL_REACTIONS_SCOPE, AddOptions, PopularActivity, REACTIONS_COUNT_KEY, ReactionService,
    ReactionState, ReactionStates, activity_permalink,
};
pub use registry::{
    ActionFormat, FAVORITE, LIKE, NotificationTexts, ReactionConfig, ReactionRegistry,
    ReactionType, RegistryOptions,
};
pub use settings::{ReactionSettings, SettingsService, SubnavItem, profile_subnav};
