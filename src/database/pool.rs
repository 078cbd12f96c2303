//! Database Connection Pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

use crate::database::actions::ActionRepository;
use crate::database::notifications::NotificationRepository;
use crate::database::users::UserRepository;
use crate::error::StorageError;

pub struct DatabasePool {
    pool: PgPool,
    users: Arc<UserRepository>,
    actions: Arc<ActionRepository>,
    notifications: Arc<NotificationRepository>,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| StorageError::database("Failed to connect to PostgreSQL", e))?;

        info!(max_connections, "Connected to PostgreSQL");

        Ok(Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            actions: Arc::new(ActionRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            pool,
        })
    }

    pub async fn init_schema(&self) -> Result<(), StorageError> {
        info!("Initializing database schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS social")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to create social schema", e))?;

        // Users first: likes, comments and follows reference it
        self.users.init_schema().await?;
        self.actions.init_schema().await?;
        self.notifications.init_schema().await?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn users(&self) -> Arc<UserRepository> {
        self.users.clone()
    }

    pub fn actions(&self) -> Arc<ActionRepository> {
        self.actions.clone()
    }

    pub fn notifications(&self) -> Arc<NotificationRepository> {
        self.notifications.clone()
    }
}
