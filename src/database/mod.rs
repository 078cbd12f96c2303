//! Storage Module
//!
//! Repository traits plus the two adapters that satisfy them: PostgreSQL
//! (sqlx) and an in-memory store.

pub mod actions;
pub mod memory;
pub mod models;
pub mod notifications;
pub mod pool;
pub mod store;
pub mod users;

pub use actions::ActionRepository;
pub use memory::MemoryStore;
pub use models::{
    AccountKind, Comment, Follow, Like, Notification, NotificationKind, SnapshotUpdate, User,
    UserSnapshot,
};
pub use notifications::NotificationRepository;
pub use pool::DatabasePool;
pub use store::{ActionStore, NotificationStore, UserStore};
pub use users::UserRepository;
