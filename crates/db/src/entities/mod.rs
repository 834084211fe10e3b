//! Database entities.

#![allow(missing_docs)]

pub mod activity;
pub mod activity_meta;
pub mod notification;
pub mod site_option;
pub mod user;
pub mod user_meta;

pub use activity::Entity as Activity;
pub use activity_meta::Entity as ActivityMeta;
pub use notification::Entity as Notification;
pub use site_option::Entity as SiteOption;
pub use user::Entity as User;
pub use user_meta::Entity as UserMeta;
