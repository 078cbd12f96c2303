//! In-memory storage adapter
//!
//! Used when PostgreSQL is disabled and by the test suites. Each write holds
//! a single lock, so one snapshot update is atomic.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::models::{
    Comment, Follow, Like, Notification, SnapshotUpdate, User,
};
use crate::database::store::{ActionStore, NotificationStore, UserStore};
use crate::error::{NotificationError, StorageError};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    likes: RwLock<Vec<Like>>,
    comments: RwLock<Vec<Comment>>,
    follows: RwLock<Vec<Follow>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StorageError::Conflict(format!("user {}", user.id)));
        }
        users.insert(user.id.clone(), user.clone());
        debug!(user_id = %user.id, "User created (memory)");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError> {
        self.users.write().await.remove(user_id);
        Ok(())
    }

    async fn update_snapshot(
        &self,
        user_id: &str,
        update: &SnapshotUpdate,
    ) -> Result<(), StorageError> {
        let mut users = self.users.write().await;
        // Updating a vanished row is a no-op, like an UPDATE matching zero rows
        if let Some(user) = users.get_mut(user_id) {
            user.snapshot = update.into_snapshot();
        }
        Ok(())
    }
}

#[async_trait]
impl ActionStore for MemoryStore {
    async fn count_likes_by_user(&self, user_id: &str) -> Result<Option<u64>, StorageError> {
        let likes = self.likes.read().await;
        Ok(Some(likes.iter().filter(|l| l.user_id == user_id).count() as u64))
    }

    async fn count_comments_by_user(&self, user_id: &str) -> Result<Option<u64>, StorageError> {
        let comments = self.comments.read().await;
        Ok(Some(
            comments.iter().filter(|c| c.user_id == user_id).count() as u64,
        ))
    }

    async fn list_follows_by_user(&self, user_id: &str) -> Result<Vec<Follow>, StorageError> {
        let follows = self.follows.read().await;
        Ok(follows
            .iter()
            .filter(|f| f.follower_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_like(&self, like: &Like) -> Result<bool, StorageError> {
        let mut likes = self.likes.write().await;
        let exists = likes
            .iter()
            .any(|l| l.user_id == like.user_id && l.publication_id == like.publication_id);
        if exists {
            return Ok(false);
        }
        likes.push(like.clone());
        Ok(true)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        self.comments.write().await.push(comment.clone());
        Ok(())
    }

    async fn add_follow(&self, follow: &Follow) -> Result<bool, StorageError> {
        let mut follows = self.follows.write().await;
        let exists = follows.iter().any(|f| {
            f.follower_id == follow.follower_id && f.followed_id == follow.followed_id
        });
        if exists {
            return Ok(false);
        }
        follows.push(follow.clone());
        Ok(true)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn add(&self, notification: Notification) -> Result<(), NotificationError> {
        self.notifications.write().await.push(notification);
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.recipient == recipient)
            .take(limit)
            .cloned()
            .collect())
    }
}
