//! Action Repository - PostgreSQL operations for likes, comments and follows using sqlx

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::database::models::{Comment, Follow, Like};
use crate::database::store::ActionStore;
use crate::error::StorageError;

pub struct ActionRepository {
    pool: PgPool,
}

impl ActionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social.likes (
                user_id VARCHAR(255) NOT NULL REFERENCES social.users(id) ON DELETE CASCADE,
                publication_id VARCHAR(255) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                PRIMARY KEY (user_id, publication_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create likes table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social.comments (
                id UUID PRIMARY KEY,
                user_id VARCHAR(255) NOT NULL REFERENCES social.users(id) ON DELETE CASCADE,
                publication_id VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create comments table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social.follows (
                follower_id VARCHAR(255) NOT NULL REFERENCES social.users(id) ON DELETE CASCADE,
                followed_id VARCHAR(255) NOT NULL REFERENCES social.users(id) ON DELETE CASCADE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                PRIMARY KEY (follower_id, followed_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create follows table", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_user ON social.comments(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to create comments index", e))?;

        info!("Action tables ready");
        Ok(())
    }

    async fn count(&self, sql: &'static str, user_id: &str) -> Result<u64, StorageError> {
        let row = sqlx::query(sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to count actions", e))?;

        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl ActionStore for ActionRepository {
    async fn count_likes_by_user(&self, user_id: &str) -> Result<Option<u64>, StorageError> {
        let count = self
            .count(
                "SELECT COUNT(*) AS count FROM social.likes WHERE user_id = $1",
                user_id,
            )
            .await?;
        Ok(Some(count))
    }

    async fn count_comments_by_user(&self, user_id: &str) -> Result<Option<u64>, StorageError> {
        let count = self
            .count(
                "SELECT COUNT(*) AS count FROM social.comments WHERE user_id = $1",
                user_id,
            )
            .await?;
        Ok(Some(count))
    }

    async fn list_follows_by_user(&self, user_id: &str) -> Result<Vec<Follow>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT follower_id, followed_id, created_at
            FROM social.follows
            WHERE follower_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to list follows", e))?;

        let follows: Vec<Follow> = rows
            .into_iter()
            .map(|row| Follow {
                follower_id: row.get("follower_id"),
                followed_id: row.get("followed_id"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(follows)
    }

    async fn add_like(&self, like: &Like) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO social.likes (user_id, publication_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, publication_id) DO NOTHING
            "#,
        )
        .bind(&like.user_id)
        .bind(&like.publication_id)
        .bind(like.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to insert like", e))?;

        debug!(user_id = %like.user_id, publication_id = %like.publication_id, "Like stored");
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO social.comments (id, user_id, publication_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.user_id)
        .bind(&comment.publication_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to insert comment", e))?;

        Ok(())
    }

    async fn add_follow(&self, follow: &Follow) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO social.follows (follower_id, followed_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(&follow.follower_id)
        .bind(&follow.followed_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to insert follow", e))?;

        Ok(result.rows_affected() > 0)
    }
}
