//! Impact Engine - reward orchestrator
//!
//! Reads a user's reward snapshot, counts live validated actions, applies the
//! block calculation and writes the new snapshot back as one update. Reward
//! notifications are sent after the write and their failures are dropped.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::database::{
    ActionStore, Notification, NotificationKind, NotificationStore, SnapshotUpdate, UserStore,
};
use crate::error::{NotificationError, StorageError};
use crate::impact::aggregator::count_valid_actions;
use crate::impact::calculator::{
    clamp_counter, compute_reward, level_for_points, REGISTRATION_BONUS,
};

/// What an update granted, returned to the caller for immediate feedback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactUpdate {
    pub points_added: u64,
    pub new_level: bool,
}

impl ImpactUpdate {
    pub fn none() -> Self {
        Self::default()
    }
}

type UserLocks = DashMap<String, Arc<Mutex<()>>>;

/// Holds one user's update lock. On drop the map entry is removed unless
/// another task still shares it.
struct UserLockGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a UserLocks,
    user_id: String,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct ImpactEngine {
    users: Arc<dyn UserStore>,
    actions: Arc<dyn ActionStore>,
    notifications: Arc<dyn NotificationStore>,

    /// Per-user update locks, present only when serialization is enabled
    user_locks: Option<UserLocks>,
}

impl ImpactEngine {
    pub fn new(
        users: Arc<dyn UserStore>,
        actions: Arc<dyn ActionStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            users,
            actions,
            notifications,
            user_locks: None,
        }
    }

    /// Run updates for the same user one at a time.
    ///
    /// Without this, two concurrent updates may both read the old snapshot and
    /// the later write wins. Reward arithmetic is the same either way.
    pub fn with_serialized_updates(mut self) -> Self {
        self.user_locks = Some(DashMap::new());
        self
    }

    pub fn serializes_updates(&self) -> bool {
        self.user_locks.is_some()
    }

    /// Recompute a user's reward snapshot from their live action count.
    ///
    /// An unknown user is not an error: it yields `ImpactUpdate::none()`.
    pub async fn update_impact_system(&self, user_id: &str) -> Result<ImpactUpdate, StorageError> {
        let _guard = self.lock_user(user_id).await;

        let snapshot = match self.users.get_snapshot(user_id).await? {
            Some(snapshot) => snapshot,
            None => {
                debug!(user_id = %user_id, "Impact update skipped, user not found");
                return Ok(ImpactUpdate::none());
            }
        };

        let actions = count_valid_actions(self.actions.as_ref(), user_id).await?;
        let live_action_count = actions.total();

        let current_points = clamp_counter(snapshot.impact_points);
        let last_rewarded = clamp_counter(snapshot.last_rewarded_action_count);
        let outcome = compute_reward(current_points, last_rewarded, live_action_count);

        let old_level = level_for_points(current_points);
        let new_level = level_for_points(outcome.new_points);

        self.users
            .update_snapshot(
                user_id,
                &SnapshotUpdate {
                    impact_points: outcome.new_points,
                    impact_level: new_level,
                    total_valid_actions: live_action_count,
                    last_rewarded_action_count: outcome.next_last_rewarded_action_count,
                },
            )
            .await?;

        debug!(
            user_id = %user_id,
            likes = actions.likes,
            comments = actions.comments,
            follows = actions.follows,
            blocks = outcome.new_blocks,
            "Impact snapshot recomputed"
        );

        if outcome.points_added > 0 {
            info!(
                user_id = %user_id,
                points_added = outcome.points_added,
                total_points = outcome.new_points,
                "Impact points granted"
            );
            self.notify_best_effort(Notification::new(
                user_id,
                NotificationKind::ImpactPoints,
                json!({
                    "pointsAdded": outcome.points_added,
                    "totalPoints": outcome.new_points,
                }),
            ))
            .await;
        }

        if new_level > old_level {
            info!(user_id = %user_id, level = new_level, "Impact level up");
            self.notify_best_effort(Notification::new(
                user_id,
                NotificationKind::ImpactLevelUp,
                json!({ "level": new_level }),
            ))
            .await;
        }

        Ok(ImpactUpdate {
            points_added: outcome.points_added,
            new_level: new_level > old_level,
        })
    }

    /// Grant the one-time signup bonus.
    ///
    /// The caller must invoke this once per account; a second call grants the
    /// bonus again. An unknown user is a silent no-op.
    pub async fn apply_registration_bonus(&self, user_id: &str) -> Result<(), StorageError> {
        let _guard = self.lock_user(user_id).await;

        let Some(snapshot) = self.users.get_snapshot(user_id).await? else {
            debug!(user_id = %user_id, "Registration bonus skipped, user not found");
            return Ok(());
        };

        let points = clamp_counter(snapshot.impact_points).saturating_add(REGISTRATION_BONUS);

        self.users
            .update_snapshot(
                user_id,
                &SnapshotUpdate {
                    impact_points: points,
                    impact_level: level_for_points(points),
                    total_valid_actions: clamp_counter(snapshot.total_valid_actions),
                    last_rewarded_action_count: clamp_counter(snapshot.last_rewarded_action_count),
                },
            )
            .await?;

        info!(user_id = %user_id, total_points = points, "Registration bonus applied");
        Ok(())
    }

    async fn notify_best_effort(&self, notification: Notification) {
        let kind = notification.kind;
        let result: Result<(), NotificationError> = self.notifications.add(notification).await;
        if let Err(e) = result {
            warn!(kind = %kind, error = %e, "Dropping undeliverable reward notification");
        }
    }

    async fn lock_user(&self, user_id: &str) -> Option<UserLockGuard<'_>> {
        let locks = self.user_locks.as_ref()?;
        let lock = locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Some(UserLockGuard {
            guard: Some(lock.lock_owned().await),
            locks,
            user_id: user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{AccountKind, Follow, MemoryStore, User, UserSnapshot};
    use chrono::Utc;

    fn engine_with_store() -> (ImpactEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = ImpactEngine::new(store.clone(), store.clone(), store.clone());
        (engine, store)
    }

    async fn seed_user(store: &MemoryStore, id: &str, snapshot: UserSnapshot) {
        store
            .create_user(&User {
                id: id.to_string(),
                display_name: id.to_string(),
                email: format!("{}@example.org", id),
                kind: AccountKind::User,
                snapshot,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    async fn seed_follows(store: &MemoryStore, follower: &str, count: usize) {
        for i in 0..count {
            store
                .add_follow(&Follow {
                    follower_id: follower.to_string(),
                    followed_id: format!("assoc_{}", i),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_a_no_op() {
        let (engine, _store) = engine_with_store();
        assert_eq!(
            engine.update_impact_system("ghost").await.unwrap(),
            ImpactUpdate::none()
        );
        engine.apply_registration_bonus("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_level_up_from_21_points() {
        let (engine, store) = engine_with_store();
        seed_user(
            &store,
            "alice",
            UserSnapshot {
                impact_points: Some(21),
                impact_level: Some(1),
                total_valid_actions: Some(7),
                last_rewarded_action_count: Some(0),
            },
        )
        .await;
        seed_follows(&store, "alice", 8).await;

        let update = engine.update_impact_system("alice").await.unwrap();
        assert_eq!(
            update,
            ImpactUpdate {
                points_added: 3,
                new_level: true
            }
        );

        let snapshot = store.get_snapshot("alice").await.unwrap().unwrap();
        assert_eq!(snapshot.impact_points, Some(24));
        assert_eq!(snapshot.impact_level, Some(2));
        assert_eq!(snapshot.total_valid_actions, Some(8));
        assert_eq!(snapshot.last_rewarded_action_count, Some(8));

        let kinds: Vec<NotificationKind> = store
            .list_for_recipient("alice", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::ImpactLevelUp, NotificationKind::ImpactPoints]
        );
    }

    #[tokio::test]
    async fn test_missing_and_negative_counters_are_clamped() {
        let (engine, store) = engine_with_store();
        seed_user(
            &store,
            "legacy",
            UserSnapshot {
                impact_points: Some(-4),
                impact_level: None,
                total_valid_actions: None,
                last_rewarded_action_count: None,
            },
        )
        .await;
        seed_follows(&store, "legacy", 9).await;

        let update = engine.update_impact_system("legacy").await.unwrap();
        assert_eq!(update.points_added, 3);
        assert!(!update.new_level);

        let snapshot = store.get_snapshot("legacy").await.unwrap().unwrap();
        assert_eq!(snapshot.impact_points, Some(3));
        assert_eq!(snapshot.impact_level, Some(1));
        assert_eq!(snapshot.last_rewarded_action_count, Some(9));
    }

    #[tokio::test]
    async fn test_no_grant_still_refreshes_action_cache() {
        let (engine, store) = engine_with_store();
        seed_user(&store, "alice", UserSnapshot::zeroed()).await;
        seed_follows(&store, "alice", 5).await;

        let update = engine.update_impact_system("alice").await.unwrap();
        assert_eq!(update, ImpactUpdate::none());

        let snapshot = store.get_snapshot("alice").await.unwrap().unwrap();
        assert_eq!(snapshot.total_valid_actions, Some(5));
        assert_eq!(snapshot.last_rewarded_action_count, Some(0));
        assert!(store.list_for_recipient("alice", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_bonus() {
        let (engine, store) = engine_with_store();
        seed_user(&store, "fresh", UserSnapshot::zeroed()).await;
        seed_user(
            &store,
            "veteran",
            UserSnapshot {
                impact_points: Some(22),
                impact_level: Some(1),
                total_valid_actions: Some(13),
                last_rewarded_action_count: Some(8),
            },
        )
        .await;

        engine.apply_registration_bonus("fresh").await.unwrap();
        engine.apply_registration_bonus("veteran").await.unwrap();

        let fresh = store.get_snapshot("fresh").await.unwrap().unwrap();
        assert_eq!(fresh.impact_points, Some(3));
        assert_eq!(fresh.impact_level, Some(1));

        let veteran = store.get_snapshot("veteran").await.unwrap().unwrap();
        assert_eq!(veteran.impact_points, Some(25));
        assert_eq!(veteran.impact_level, Some(2));
        assert_eq!(veteran.total_valid_actions, Some(13));
        assert_eq!(veteran.last_rewarded_action_count, Some(8));
    }

    #[tokio::test]
    async fn test_registration_bonus_is_not_guarded() {
        let (engine, store) = engine_with_store();
        seed_user(&store, "alice", UserSnapshot::zeroed()).await;

        engine.apply_registration_bonus("alice").await.unwrap();
        engine.apply_registration_bonus("alice").await.unwrap();

        let snapshot = store.get_snapshot("alice").await.unwrap().unwrap();
        assert_eq!(snapshot.impact_points, Some(6));
    }

    #[tokio::test]
    async fn test_serialized_engine_grants_once_under_concurrency() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(
            ImpactEngine::new(store.clone(), store.clone(), store.clone())
                .with_serialized_updates(),
        );
        assert!(engine.serializes_updates());
        seed_user(&store, "alice", UserSnapshot::zeroed()).await;
        seed_follows(&store, "alice", 8).await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.update_impact_system("alice").await })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            granted += handle.await.unwrap().unwrap().points_added;
        }
        assert_eq!(granted, 3);

        let snapshot = store.get_snapshot("alice").await.unwrap().unwrap();
        assert_eq!(snapshot.impact_points, Some(3));

        // Idle locks are released once every update finished
        assert!(engine.user_locks.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_entry_survives_while_shared() {
        let (engine, store) = engine_with_store();
        let engine = engine.with_serialized_updates();
        seed_user(&store, "alice", UserSnapshot::zeroed()).await;

        let locks = engine.user_locks.as_ref().unwrap();
        let held = engine.lock_user("alice").await.unwrap();
        let waiter = locks.get("alice").map(|entry| entry.value().clone()).unwrap();
        drop(held);
        assert_eq!(locks.len(), 1);

        drop(waiter);
        engine.apply_registration_bonus("alice").await.unwrap();
        assert!(locks.is_empty());
    }

    #[test]
    fn test_impact_update_wire_shape() {
        let update = ImpactUpdate {
            points_added: 3,
            new_level: true,
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({ "pointsAdded": 3, "newLevel": true })
        );
        assert_eq!(
            serde_json::to_value(ImpactUpdate::none()).unwrap(),
            json!({ "pointsAdded": 0, "newLevel": false })
        );
    }
}
