//! HTTP API layer for UniVerse.
//!
//! - **Endpoints**: accounts, profiles, posts, stories, videos, groups, messaging, AI helpers
//! - **Extractors**: authenticated and optional-viewer users
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
