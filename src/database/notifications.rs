//! Notification Repository - PostgreSQL persistence for user notifications

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::database::models::Notification;
use crate::database::store::NotificationStore;
use crate::error::{NotificationError, StorageError};

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social.notifications (
                id UUID PRIMARY KEY,
                recipient VARCHAR(255) NOT NULL,
                kind VARCHAR(32) NOT NULL,
                payload JSONB NOT NULL,
                read BOOLEAN DEFAULT FALSE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create notifications table", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON social.notifications(recipient, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to create notifications index", e))?;

        info!("Notifications table ready");
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn add(&self, notification: Notification) -> Result<(), NotificationError> {
        sqlx::query(
            r#"
            INSERT INTO social.notifications (id, recipient, kind, payload, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.id)
        .bind(&notification.recipient)
        .bind(notification.kind.as_str())
        .bind(&notification.payload)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to insert notification", e))?;

        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipient, kind, payload, read, created_at
            FROM social.notifications
            WHERE recipient = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to list notifications", e))?;

        rows.into_iter()
            .map(|row| {
                let kind: String = row.get("kind");
                Ok(Notification {
                    id: row.get("id"),
                    recipient: row.get("recipient"),
                    kind: kind.parse()?,
                    payload: row.get("payload"),
                    read: row.get("read"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
