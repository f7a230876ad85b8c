use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rewards::{ActivityKind, SkipReason};

/// Every ledger decision produces Events.
/// The UI turns them into toasts and celebrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PointsAwarded {
        activity: ActivityKind,
        award: u64,
        total: u64,
        /// True when this award carried the first-of-the-day bonus.
        first_of_day: bool,
        at: DateTime<Utc>,
    },
    /// Activity did not qualify; the balance is unchanged.
    AwardSkipped {
        activity: ActivityKind,
        reason: SkipReason,
        at: DateTime<Utc>,
    },
    MilestoneReached {
        milestone: u64,
        total: u64,
        at: DateTime<Utc>,
    },
}

/// Payload for the "+N Points / Total: T" toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToast {
    pub points_added: u64,
    pub total_points: u64,
    /// Milestone to celebrate alongside the toast, if one was just crossed.
    pub milestone: Option<u64>,
    pub duration_ms: u64,
}
