//! Impact Reward Engine
//!
//! Turns validated actions (likes, comments, follows) into impact points and
//! levels.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ ActionAggregator │────►│   ImpactEngine   │◄────│ RewardCalculator │
//! │ (live count)     │     │  (orchestrator)  │     │ (pure blocks)    │
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//!                                   │
//!                          ┌────────┴─────────┐
//!                          ▼                  ▼
//!                    ┌───────────┐    ┌────────────────┐
//!                    │ UserStore │    │ Notifications  │
//!                    │ (snapshot)│    │ (best-effort)  │
//!                    └───────────┘    └────────────────┘
//! ```
//!
//! ## Reward Model
//!
//! - Every 8 validated actions form a block worth +3 points
//! - Blocks are derived from cumulative counts, never from a running tally
//! - Level is `points / 24 + 1`, recomputed on every write
//! - New accounts receive a one-time +3 bonus

pub mod aggregator;
pub mod calculator;
pub mod engine;

pub use aggregator::{count_valid_actions, ValidActionCount};
pub use calculator::{
    actions_until_next_block, clamp_counter, compute_reward, level_for_points, RewardOutcome,
    ACTIONS_PER_BLOCK, POINTS_PER_BLOCK, POINTS_PER_LEVEL, REGISTRATION_BONUS,
};
pub use engine::{ImpactEngine, ImpactUpdate};
