//! Per-activity daily bonus state.
//!
//! Each rewarded activity keeps one small record: the day it was last
//! rewarded and whether that day's first bonus has been paid. Whether the
//! bonus is still available is recomputed from the clock on every award, so a
//! new calendar day resets it without any stored transition.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Categories of rewarded action, each with independent daily tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Saved journal entry
    Journal,
    /// Completed mini-game
    Game,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 2] = [ActivityKind::Journal, ActivityKind::Game];

    /// Storage key of this kind's daily record.
    pub fn daily_key(self) -> &'static str {
        match self {
            ActivityKind::Journal => "points.journal.daily",
            ActivityKind::Game => "points.game.daily",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Journal => "journal",
            ActivityKind::Game => "game",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "journal" => Ok(ActivityKind::Journal),
            "game" => Ok(ActivityKind::Game),
            other => Err(format!("unknown activity kind: {other}")),
        }
    }
}

/// Bonus sizes for one activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Paid for the first qualifying action of the day
    pub first_bonus: u64,
    /// Paid for every later qualifying action that day
    pub repeat_bonus: u64,
}

/// Where an activity sits in its daily cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyPhase {
    NoRewardToday,
    FirstRewardGiven,
}

/// Persisted daily record for one activity kind.
///
/// `count` is telemetry only and never feeds the reward decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityDailyState {
    #[serde(rename = "date", default)]
    pub last_reward_date: Option<NaiveDate>,
    #[serde(default)]
    pub first_bonus_given: bool,
    #[serde(default)]
    pub count: u32,
}

impl ActivityDailyState {
    pub fn phase(&self, today: NaiveDate) -> DailyPhase {
        if self.last_reward_date == Some(today) && self.first_bonus_given {
            DailyPhase::FirstRewardGiven
        } else {
            DailyPhase::NoRewardToday
        }
    }

    /// Decide the award for one qualifying action on `today`.
    ///
    /// Returns the award and the record to persist. A record from an earlier
    /// day (or none) pays the first bonus; the same day pays the first bonus
    /// only if it was somehow never marked as given.
    pub fn next(&self, today: NaiveDate, policy: RewardPolicy) -> (u64, ActivityDailyState) {
        if self.last_reward_date != Some(today) {
            let state = ActivityDailyState {
                last_reward_date: Some(today),
                first_bonus_given: true,
                count: 1,
            };
            return (policy.first_bonus, state);
        }

        let award = if self.first_bonus_given {
            policy.repeat_bonus
        } else {
            policy.first_bonus
        };
        let state = ActivityDailyState {
            last_reward_date: Some(today),
            first_bonus_given: true,
            count: self.count.saturating_add(1),
        };
        (award, state)
    }
}
