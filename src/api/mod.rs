//! HTTP API endpoints
//!
//! Provides REST APIs for:
//! - Account registration (grants the signup bonus)
//! - Follows, likes and comments (each recomputes the actor's impact)
//! - Impact summaries and notification inboxes

pub mod error;
pub mod users;

pub use error::ApiError;
pub use users::{create_router as create_users_router, UsersApiState};
