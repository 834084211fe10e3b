//! Common utilities and shared types for the reactions service.
//!
//! This crate provides foundational components used across all reactions crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Nonces**: Action-scoped request tokens via [`NonceSigner`]
//!
//! # Example
//!
//! ```no_run
//! use reactions_common::{AppResult, Config, NonceAction, NonceSigner};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let signer = NonceSigner::from_config(&config.security);
//!     let nonce = signer.create(NonceAction::Fetch, 0);
//!     assert!(signer.verify(&nonce, NonceAction::Fetch, 0));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod nonce;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use nonce::{NonceAction, NonceSigner};
