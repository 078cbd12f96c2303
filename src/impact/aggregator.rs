//! Action Aggregator
//!
//! Sums the validated actions a user authored across the three action
//! sources. Reads only.

use crate::database::ActionStore;
use crate::error::StorageError;

/// Per-source breakdown of a user's validated actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidActionCount {
    pub likes: u64,
    pub comments: u64,
    pub follows: u64,
}

impl ValidActionCount {
    pub fn total(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.follows)
    }
}

/// Count the validated actions authored by `user_id`.
///
/// Likes and comments contribute 0 when the store has no counting capability
/// for them. Follows are always counted from the full list.
pub async fn count_valid_actions(
    actions: &dyn ActionStore,
    user_id: &str,
) -> Result<ValidActionCount, StorageError> {
    let likes = actions.count_likes_by_user(user_id).await?.unwrap_or(0);
    let comments = actions.count_comments_by_user(user_id).await?.unwrap_or(0);
    let follows = actions.list_follows_by_user(user_id).await?.len() as u64;

    Ok(ValidActionCount {
        likes,
        comments,
        follows,
    })
}
