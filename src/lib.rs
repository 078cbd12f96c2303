//! Impact Rewards
//!
//! Backend core for a social network connecting users and associations.
//! Validated actions (likes, comments, follows) earn impact points in blocks,
//! and points map to impact levels.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Storage and notification errors
//! ├── impact/        - Impact reward engine
//! │   ├── calculator.rs - Block arithmetic & level derivation
//! │   ├── aggregator.rs - Validated action counting
//! │   └── engine.rs     - Update orchestrator & registration bonus
//! ├── social/        - Registration, follows, likes, comments
//! ├── api/           - HTTP API endpoints
//! └── database/      - Repository traits, PostgreSQL & in-memory adapters
//! ```

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod impact;
pub mod social;

// Re-export main types for convenience
pub use config::ImpactConfig;
pub use database::{
    AccountKind, ActionStore, DatabasePool, MemoryStore, Notification, NotificationKind,
    NotificationStore, SnapshotUpdate, User, UserSnapshot, UserStore,
};
pub use error::{NotificationError, StorageError};
pub use impact::{
    compute_reward, count_valid_actions, level_for_points, ImpactEngine, ImpactUpdate,
    RewardOutcome, ValidActionCount, ACTIONS_PER_BLOCK, POINTS_PER_BLOCK, REGISTRATION_BONUS,
};
pub use social::{ImpactSummary, NewUser, SocialError, SocialService};

// Re-export API types
pub use api::{create_users_router, ApiError, UsersApiState};
