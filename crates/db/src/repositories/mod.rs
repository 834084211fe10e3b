//! Repositories over the activity tables.

pub mod activity;
pub mod activity_meta;
pub mod notification;
pub mod site_option;
pub mod user;
pub mod user_meta;

pub use activity::{ActivityRepository, REACTIONS_COMPONENT};
pub use activity_meta::ActivityMetaRepository;
pub use notification::NotificationRepository;
pub use site_option::SiteOptionRepository;
pub use user::UserRepository;
pub use user_meta::UserMetaRepository;
