//! Reward Calculator
//!
//! Converts cumulative validated-action counts into reward blocks. Blocks are
//! derived by floor division on the cumulative counters, so re-running the
//! calculation with an unchanged live count grants nothing.

/// Validated actions needed for one reward block
pub const ACTIONS_PER_BLOCK: u64 = 8;

/// Points granted per reward block
pub const POINTS_PER_BLOCK: u64 = 3;

/// Points spanned by one impact level
pub const POINTS_PER_LEVEL: u64 = 24;

/// Flat bonus granted once at account creation
pub const REGISTRATION_BONUS: u64 = 3;

/// Result of one reward calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardOutcome {
    pub new_points: u64,
    pub new_blocks: u64,
    pub points_added: u64,
    pub next_last_rewarded_action_count: u64,
}

/// Compute the blocks crossed since the last rewarded action count.
///
/// A live count at or below the last rewarded count yields zero blocks, and
/// the high-water mark only moves when at least one block is granted.
pub fn compute_reward(
    current_points: u64,
    last_rewarded_action_count: u64,
    live_action_count: u64,
) -> RewardOutcome {
    let blocks_earned_total = live_action_count / ACTIONS_PER_BLOCK;
    let blocks_already_rewarded = last_rewarded_action_count / ACTIONS_PER_BLOCK;
    let new_blocks = blocks_earned_total.saturating_sub(blocks_already_rewarded);
    let points_added = new_blocks.saturating_mul(POINTS_PER_BLOCK);

    RewardOutcome {
        new_points: current_points.saturating_add(points_added),
        new_blocks,
        points_added,
        next_last_rewarded_action_count: if new_blocks > 0 {
            live_action_count
        } else {
            last_rewarded_action_count
        },
    }
}

/// The only place a level is derived. Stored levels always come from here.
pub fn level_for_points(points: u64) -> u64 {
    (points / POINTS_PER_LEVEL + 1).max(1)
}

/// Validated actions still missing before the next block, given a live count.
pub fn actions_until_next_block(live_action_count: u64) -> u64 {
    ACTIONS_PER_BLOCK - live_action_count % ACTIONS_PER_BLOCK
}

/// Read a stored counter, treating missing or negative values as zero.
pub fn clamp_counter(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}
