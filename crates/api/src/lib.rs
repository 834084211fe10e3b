//! HTTP API for the reactions service.
//!
//! - **Endpoints**: fetch and save reactions, profile listings, settings,
//!   notifications and the favorites migration
//! - **Extractors**: authentication and validated JSON bodies
//! - **Middleware**: bearer-token authentication
//!
//! Every route is POST-only and answers with `{ "data": ... }` on success or
//! `{ "error": { "code", "message" } }` on failure.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
