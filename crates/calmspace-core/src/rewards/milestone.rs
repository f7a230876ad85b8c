//! Milestone detection over the running point total.
//!
//! A milestone counts as reached only while the total sits inside a short
//! window past the threshold, so the celebration fires once around the
//! crossing instead of on every later award.

use serde::{Deserialize, Serialize};

/// Default cumulative thresholds, ascending.
pub const DEFAULT_MILESTONES: [u64; 4] = [75, 500, 1000, 1750];

/// Default recency window in points.
pub const DEFAULT_MILESTONE_WINDOW: u64 = 20;

/// Ordered milestone thresholds plus the recency window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSet {
    thresholds: Vec<u64>,
    window: u64,
}

impl Default for MilestoneSet {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_MILESTONES.to_vec(),
            window: DEFAULT_MILESTONE_WINDOW,
        }
    }
}

impl MilestoneSet {
    /// Thresholds are sorted ascending and deduplicated.
    pub fn new(mut thresholds: Vec<u64>, window: u64) -> Self {
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds, window }
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// First threshold `m` with `m <= total` and `total - m < window`.
    ///
    /// A total that jumps more than `window` past a threshold in one step
    /// never reports that threshold.
    pub fn check(&self, total: u64) -> Option<u64> {
        self.thresholds
            .iter()
            .copied()
            .find(|&m| m <= total && total - m < self.window)
    }
}

/// [`MilestoneSet::check`] with the default thresholds and window.
pub fn check_milestone(total: u64) -> Option<u64> {
    MilestoneSet::default().check(total)
}
