//! Storage-agnostic repository traits.
//!
//! The impact engine and the social service only see these traits. Two
//! adapters implement them: PostgreSQL (`pool`, `users`, `actions`,
//! `notifications`) and the in-memory `MemoryStore`.

use async_trait::async_trait;

use crate::database::models::{
    Comment, Follow, Like, Notification, SnapshotUpdate, User, UserSnapshot,
};
use crate::error::{NotificationError, StorageError};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `StorageError::Conflict` on a duplicate id.
    async fn create_user(&self, user: &User) -> Result<(), StorageError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError>;

    /// Remove an account. Deleting an unknown id is not an error.
    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError>;

    /// Reward counters only; `None` when the user does not exist.
    async fn get_snapshot(&self, user_id: &str) -> Result<Option<UserSnapshot>, StorageError> {
        Ok(self.get_user(user_id).await?.map(|user| user.snapshot))
    }

    /// Replace all four reward counters in a single write.
    async fn update_snapshot(
        &self,
        user_id: &str,
        update: &SnapshotUpdate,
    ) -> Result<(), StorageError>;
}

/// Likes, comments and follows authored by users.
///
/// Like and comment counting are optional capabilities: a store that cannot
/// count them keeps the default `Ok(None)`. Follows must always be listable.
#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn count_likes_by_user(&self, _user_id: &str) -> Result<Option<u64>, StorageError> {
        Ok(None)
    }

    async fn count_comments_by_user(&self, _user_id: &str) -> Result<Option<u64>, StorageError> {
        Ok(None)
    }

    async fn list_follows_by_user(&self, user_id: &str) -> Result<Vec<Follow>, StorageError>;

    /// Returns `false` when the user already liked the publication.
    async fn add_like(&self, like: &Like) -> Result<bool, StorageError>;

    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError>;

    /// Returns `false` when the follow already exists.
    async fn add_follow(&self, follow: &Follow) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn add(&self, notification: Notification) -> Result<(), NotificationError>;

    /// Newest first.
    async fn list_for_recipient(
        &self,
        recipient: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError>;
}
