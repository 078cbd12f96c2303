//! Error types shared by the storage adapters and the impact engine.

use thiserror::Error;

/// Failure reading or writing the repository.
///
/// This is the only error class the impact engine propagates to its callers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        source: sqlx::Error,
    },

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn database(context: &'static str, source: sqlx::Error) -> Self {
        Self::Database { context, source }
    }
}

/// Failure delivering a notification. Never surfaced by the impact engine.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to store notification: {0}")]
    Storage(#[from] StorageError),

    #[error("notification rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
}
