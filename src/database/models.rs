//! Records persisted by the storage adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StorageError;

/// Whether an account belongs to a person or to an association (nonprofit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Association,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::User => "user",
            AccountKind::Association => "association",
        }
    }
}

impl FromStr for AccountKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(AccountKind::User),
            "association" => Ok(AccountKind::Association),
            other => Err(StorageError::Corrupt(format!("unknown account kind '{}'", other))),
        }
    }
}

/// Reward counters stored on the user row.
///
/// Every field may be missing on rows written before the reward columns
/// existed; readers clamp missing or negative values to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub impact_points: Option<i64>,
    pub impact_level: Option<i64>,
    pub total_valid_actions: Option<i64>,
    pub last_rewarded_action_count: Option<i64>,
}

impl UserSnapshot {
    /// Snapshot of a freshly created account
    pub fn zeroed() -> Self {
        Self {
            impact_points: Some(0),
            impact_level: Some(1),
            total_valid_actions: Some(0),
            last_rewarded_action_count: Some(0),
        }
    }
}

/// Full replacement of the reward counters, written as one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotUpdate {
    pub impact_points: u64,
    pub impact_level: u64,
    pub total_valid_actions: u64,
    pub last_rewarded_action_count: u64,
}

impl SnapshotUpdate {
    pub fn into_snapshot(self) -> UserSnapshot {
        UserSnapshot {
            impact_points: Some(to_db(self.impact_points)),
            impact_level: Some(to_db(self.impact_level)),
            total_valid_actions: Some(to_db(self.total_valid_actions)),
            last_rewarded_action_count: Some(to_db(self.last_rewarded_action_count)),
        }
    }
}

/// Convert an unsigned counter to the signed column type, saturating.
pub fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub kind: AccountKind,
    pub snapshot: UserSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub user_id: String,
    pub publication_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: String,
    pub publication_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    ImpactPoints,
    ImpactLevelUp,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::ImpactPoints => "impact_points",
            NotificationKind::ImpactLevelUp => "impact_level_up",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationKind::Follow),
            "impact_points" => Ok(NotificationKind::ImpactPoints),
            "impact_level_up" => Ok(NotificationKind::ImpactLevelUp),
            other => Err(StorageError::Corrupt(format!(
                "unknown notification kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient: &str, kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            kind,
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_column_text() {
        for kind in [
            NotificationKind::Follow,
            NotificationKind::ImpactPoints,
            NotificationKind::ImpactLevelUp,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("poke".parse::<NotificationKind>().is_err());
        assert!("admin".parse::<AccountKind>().is_err());
    }

    #[test]
    fn test_to_db_saturates() {
        assert_eq!(to_db(42), 42);
        assert_eq!(to_db(u64::MAX), i64::MAX);
    }
}
