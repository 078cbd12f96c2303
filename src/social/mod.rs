//! Social flows: registration, follows, likes and comments.
//!
//! Each flow records its action, then asks the impact engine to recompute
//! the acting user's rewards.

mod service;

pub use service::{ImpactSummary, NewUser, SocialError, SocialService, MAX_COMMENT_LENGTH};
