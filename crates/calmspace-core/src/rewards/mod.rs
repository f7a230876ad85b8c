//! Gamification rewards: daily bonuses, the point balance and milestones.
//!
//! Journal entries and completed games earn points. The first qualifying
//! action of each kind per calendar day pays a bigger bonus than repeats.

pub mod ledger;
pub mod milestone;
pub mod state;

pub use ledger::{AwardOutcome, RewardsLedger, SkipReason, BALANCE_KEY};
pub use milestone::{check_milestone, MilestoneSet, DEFAULT_MILESTONES, DEFAULT_MILESTONE_WINDOW};
pub use state::{ActivityDailyState, ActivityKind, DailyPhase, RewardPolicy};
