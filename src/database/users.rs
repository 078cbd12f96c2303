//! User Repository - PostgreSQL operations for accounts and reward counters using sqlx

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::database::models::{to_db, SnapshotUpdate, User, UserSnapshot};
use crate::database::store::UserStore;
use crate::error::StorageError;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StorageError> {
        // Reward columns are nullable: rows created before they existed read as zero
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social.users (
                id VARCHAR(255) PRIMARY KEY,
                display_name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                kind VARCHAR(32) NOT NULL,
                impact_points BIGINT DEFAULT 0,
                impact_level BIGINT DEFAULT 1,
                total_valid_actions BIGINT DEFAULT 0,
                last_rewarded_action_count BIGINT DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create users table", e))?;

        info!("Users table ready");
        Ok(())
    }

    fn user_from_row(row: &PgRow) -> Result<User, StorageError> {
        let kind: String = row.get("kind");
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(User {
            id: row.get("id"),
            display_name: row.get("display_name"),
            email: row.get("email"),
            kind: kind.parse()?,
            snapshot: UserSnapshot {
                impact_points: row.get("impact_points"),
                impact_level: row.get("impact_level"),
                total_valid_actions: row.get("total_valid_actions"),
                last_rewarded_action_count: row.get("last_rewarded_action_count"),
            },
            created_at,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO social.users
            (id, display_name, email, kind, impact_points, impact_level,
             total_valid_actions, last_rewarded_action_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(user.kind.as_str())
        .bind(user.snapshot.impact_points)
        .bind(user.snapshot.impact_level)
        .bind(user.snapshot.total_valid_actions)
        .bind(user.snapshot.last_rewarded_action_count)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to insert user", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!("user {}", user.id)));
        }

        debug!(user_id = %user.id, kind = user.kind.as_str(), "User created");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, email, kind, impact_points, impact_level,
                   total_valid_actions, last_rewarded_action_count, created_at
            FROM social.users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to get user", e))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM social.users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to delete user", e))?;

        debug!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn get_snapshot(&self, user_id: &str) -> Result<Option<UserSnapshot>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT impact_points, impact_level, total_valid_actions, last_rewarded_action_count
            FROM social.users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to get impact snapshot", e))?;

        Ok(row.map(|row| UserSnapshot {
            impact_points: row.get("impact_points"),
            impact_level: row.get("impact_level"),
            total_valid_actions: row.get("total_valid_actions"),
            last_rewarded_action_count: row.get("last_rewarded_action_count"),
        }))
    }

    async fn update_snapshot(
        &self,
        user_id: &str,
        update: &SnapshotUpdate,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE social.users
            SET impact_points = $2,
                impact_level = $3,
                total_valid_actions = $4,
                last_rewarded_action_count = $5
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(to_db(update.impact_points))
        .bind(to_db(update.impact_level))
        .bind(to_db(update.total_valid_actions))
        .bind(to_db(update.last_rewarded_action_count))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to update impact snapshot", e))?;

        debug!(
            user_id = %user_id,
            points = update.impact_points,
            level = update.impact_level,
            "Impact snapshot written"
        );
        Ok(())
    }
}
