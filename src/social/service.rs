//! Social Service - action-producing flows that feed the impact engine

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::{
    AccountKind, ActionStore, Comment, Follow, Like, Notification, NotificationKind,
    NotificationStore, User, UserSnapshot, UserStore,
};
use crate::error::StorageError;
use crate::impact::{
    actions_until_next_block, clamp_counter, level_for_points, ImpactEngine, ImpactUpdate,
};

/// Longest accepted comment body, in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("users cannot follow themselves")]
    SelfFollow,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Generated when absent
    pub id: Option<String>,
    pub display_name: String,
    pub email: String,
    pub kind: AccountKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub user_id: String,
    pub impact_points: u64,
    pub impact_level: u64,
    pub total_valid_actions: u64,
    pub actions_until_next_block: u64,
}

pub struct SocialService {
    users: Arc<dyn UserStore>,
    actions: Arc<dyn ActionStore>,
    notifications: Arc<dyn NotificationStore>,
    engine: Arc<ImpactEngine>,
}

impl SocialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        actions: Arc<dyn ActionStore>,
        notifications: Arc<dyn NotificationStore>,
        engine: Arc<ImpactEngine>,
    ) -> Self {
        Self {
            users,
            actions,
            notifications,
            engine,
        }
    }

    /// Create an account with a zeroed snapshot, then grant the signup bonus once.
    pub async fn register_user(&self, new_user: NewUser) -> Result<User, SocialError> {
        let display_name = new_user.display_name.trim();
        if display_name.is_empty() {
            return Err(SocialError::InvalidInput("display_name is empty".to_string()));
        }
        if !new_user.email.contains('@') {
            return Err(SocialError::InvalidInput(format!(
                "malformed email '{}'",
                new_user.email
            )));
        }

        let id = new_user
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let user = User {
            id: id.clone(),
            display_name: display_name.to_string(),
            email: new_user.email,
            kind: new_user.kind,
            snapshot: UserSnapshot::zeroed(),
            created_at: Utc::now(),
        };
        self.users.create_user(&user).await?;
        if let Err(e) = self.engine.apply_registration_bonus(&id).await {
            // An account never outlives a failed bonus write
            if let Err(rollback) = self.users.delete_user(&id).await {
                error!(user_id = %id, error = %rollback, "Failed to roll back registration");
            }
            return Err(e.into());
        }

        info!(user_id = %id, kind = user.kind.as_str(), "User registered");

        self.users
            .get_user(&id)
            .await?
            .ok_or(SocialError::UserNotFound(id))
    }

    pub async fn follow(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<ImpactUpdate, SocialError> {
        if follower_id == followed_id {
            return Err(SocialError::SelfFollow);
        }
        self.require_user(follower_id).await?;
        self.require_user(followed_id).await?;

        let stored = self
            .actions
            .add_follow(&Follow {
                follower_id: follower_id.to_string(),
                followed_id: followed_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        if !stored {
            debug!(follower_id = %follower_id, followed_id = %followed_id, "Already following");
            return Ok(ImpactUpdate::none());
        }

        let notification = Notification::new(
            followed_id,
            NotificationKind::Follow,
            json!({ "followerId": follower_id }),
        );
        if let Err(e) = self.notifications.add(notification).await {
            warn!(followed_id = %followed_id, error = %e, "Follow notification not delivered");
        }

        Ok(self.engine.update_impact_system(follower_id).await?)
    }

    pub async fn like(
        &self,
        user_id: &str,
        publication_id: &str,
    ) -> Result<ImpactUpdate, SocialError> {
        if publication_id.trim().is_empty() {
            return Err(SocialError::InvalidInput("publication_id is empty".to_string()));
        }
        self.require_user(user_id).await?;

        let stored = self
            .actions
            .add_like(&Like {
                user_id: user_id.to_string(),
                publication_id: publication_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        if !stored {
            return Ok(ImpactUpdate::none());
        }

        Ok(self.engine.update_impact_system(user_id).await?)
    }

    pub async fn comment(
        &self,
        user_id: &str,
        publication_id: &str,
        content: &str,
    ) -> Result<ImpactUpdate, SocialError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SocialError::InvalidInput("comment is empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(SocialError::InvalidInput(format!(
                "comment exceeds {} characters",
                MAX_COMMENT_LENGTH
            )));
        }
        if publication_id.trim().is_empty() {
            return Err(SocialError::InvalidInput("publication_id is empty".to_string()));
        }
        self.require_user(user_id).await?;

        self.actions
            .add_comment(&Comment {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                publication_id: publication_id.to_string(),
                content: content.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        Ok(self.engine.update_impact_system(user_id).await?)
    }

    pub async fn impact(&self, user_id: &str) -> Result<ImpactSummary, SocialError> {
        let snapshot = self
            .users
            .get_snapshot(user_id)
            .await?
            .ok_or_else(|| SocialError::UserNotFound(user_id.to_string()))?;

        let points = clamp_counter(snapshot.impact_points);
        let total_valid_actions = clamp_counter(snapshot.total_valid_actions);

        Ok(ImpactSummary {
            user_id: user_id.to_string(),
            impact_points: points,
            impact_level: level_for_points(points),
            total_valid_actions,
            actions_until_next_block: actions_until_next_block(total_valid_actions),
        })
    }

    pub async fn notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, SocialError> {
        self.require_user(user_id).await?;
        Ok(self.notifications.list_for_recipient(user_id, limit).await?)
    }

    async fn require_user(&self, user_id: &str) -> Result<(), SocialError> {
        match self.users.get_snapshot(user_id).await? {
            Some(_) => Ok(()),
            None => Err(SocialError::UserNotFound(user_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> SocialService {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(ImpactEngine::new(store.clone(), store.clone(), store.clone()));
        SocialService::new(store.clone(), store.clone(), store, engine)
    }

    fn new_user(id: &str, kind: AccountKind) -> NewUser {
        NewUser {
            id: Some(id.to_string()),
            display_name: id.to_string(),
            email: format!("{}@example.org", id),
            kind,
        }
    }

    #[tokio::test]
    async fn test_register_applies_bonus() {
        let service = service();
        let user = service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();
        assert_eq!(user.snapshot.impact_points, Some(3));
        assert_eq!(user.snapshot.impact_level, Some(1));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let service = service();
        service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();

        let duplicate = service
            .register_user(new_user("alice", AccountKind::User))
            .await;
        assert!(matches!(
            duplicate,
            Err(SocialError::Storage(StorageError::Conflict(_)))
        ));

        let mut blank = new_user("bob", AccountKind::User);
        blank.display_name = "   ".to_string();
        assert!(matches!(
            service.register_user(blank).await,
            Err(SocialError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_follow_rules() {
        let service = service();
        service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();
        service
            .register_user(new_user("unicef", AccountKind::Association))
            .await
            .unwrap();

        assert!(matches!(
            service.follow("alice", "alice").await,
            Err(SocialError::SelfFollow)
        ));
        assert!(matches!(
            service.follow("alice", "nobody").await,
            Err(SocialError::UserNotFound(_))
        ));

        service.follow("alice", "unicef").await.unwrap();
        let again = service.follow("alice", "unicef").await.unwrap();
        assert_eq!(again, ImpactUpdate::none());

        let inbox = service.notifications("unicef", 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Follow);
        assert_eq!(inbox[0].payload["followerId"], "alice");
    }

    #[tokio::test]
    async fn test_mixed_actions_reach_a_block() {
        let service = service();
        service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();

        for i in 0..4 {
            let update = service.like("alice", &format!("pub_{}", i)).await.unwrap();
            assert_eq!(update.points_added, 0);
        }
        for i in 0..3 {
            let update = service
                .comment("alice", &format!("pub_{}", i), "well done")
                .await
                .unwrap();
            assert_eq!(update.points_added, 0);
        }
        // Duplicate like is not a new action
        assert_eq!(
            service.like("alice", "pub_0").await.unwrap(),
            ImpactUpdate::none()
        );

        let update = service.comment("alice", "pub_9", "eighth").await.unwrap();
        assert_eq!(update.points_added, 3);

        let summary = service.impact("alice").await.unwrap();
        assert_eq!(summary.impact_points, 6);
        assert_eq!(summary.impact_level, 1);
        assert_eq!(summary.total_valid_actions, 8);
        assert_eq!(summary.actions_until_next_block, 8);
    }

    #[tokio::test]
    async fn test_likes_and_comments_send_no_notifications() {
        let service = service();
        service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();

        service.like("alice", "pub_1").await.unwrap();
        service.comment("alice", "pub_1", "great work").await.unwrap();

        assert!(service.notifications("alice", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_validation() {
        let service = service();
        service
            .register_user(new_user("alice", AccountKind::User))
            .await
            .unwrap();

        assert!(matches!(
            service.comment("alice", "pub_1", "  ").await,
            Err(SocialError::InvalidInput(_))
        ));
        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            service.comment("alice", "pub_1", &long).await,
            Err(SocialError::InvalidInput(_))
        ));
        assert!(matches!(
            service.impact("ghost").await,
            Err(SocialError::UserNotFound(_))
        ));
    }
}
