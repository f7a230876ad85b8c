//! Point balance and award bookkeeping.
//!
//! The ledger owns three storage entries: the all-time total and one daily
//! record per activity kind. Every award is a read-modify-write of the total
//! plus one daily record, run inside a single [`KeyValueStore::update`]. The
//! store serializes updates across connections and processes, and an internal
//! lock serializes them within one ledger, so a double tap can never pay the
//! first bonus twice and the total can never drift from the daily records.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::milestone::MilestoneSet;
use super::state::{ActivityDailyState, ActivityKind};
use crate::clock::Clock;
use crate::error::{CoreError, Result, StorageError};
use crate::events::{Event, PointsToast};
use crate::storage::{KeyValueStore, RewardsConfig};

/// Storage key of the all-time point total.
pub const BALANCE_KEY: &str = "points.total";

/// Why a call did not earn points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Journal entry shorter than the minimum word count
    TooShort { word_count: u32, min_words: u32 },
    /// Game was abandoned before completion
    NotCompleted,
}

/// Result of one award call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub activity: ActivityKind,
    /// Points credited by this call (0 when skipped)
    pub award: u64,
    /// Balance after this call
    pub total: u64,
    /// True when this award carried the first-of-the-day bonus
    pub first_of_day: bool,
    /// Milestone just crossed, only reported for calls that credited points
    pub milestone: Option<u64>,
    pub skipped: Option<SkipReason>,
}

impl AwardOutcome {
    pub fn is_awarded(&self) -> bool {
        self.award > 0
    }

    /// Toast payload, or `None` when nothing was credited.
    pub fn toast(&self, duration_ms: u64) -> Option<PointsToast> {
        self.is_awarded().then(|| PointsToast {
            points_added: self.award,
            total_points: self.total,
            milestone: self.milestone,
            duration_ms,
        })
    }

    pub fn events(&self, at: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(reason) = self.skipped {
            events.push(Event::AwardSkipped {
                activity: self.activity,
                reason,
                at,
            });
            return events;
        }

        events.push(Event::PointsAwarded {
            activity: self.activity,
            award: self.award,
            total: self.total,
            first_of_day: self.first_of_day,
            at,
        });
        if let Some(milestone) = self.milestone {
            events.push(Event::MilestoneReached {
                milestone,
                total: self.total,
                at,
            });
        }
        events
    }
}

/// Points ledger over a key-value store and a clock.
///
/// Construct one per session and hand it to whatever needs to award points.
pub struct RewardsLedger<S, C> {
    store: S,
    clock: C,
    config: RewardsConfig,
    milestones: MilestoneSet,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore, C: Clock> RewardsLedger<S, C> {
    /// Create a ledger with the default reward policy.
    pub fn new(store: S, clock: C) -> Self {
        Self::with_config(store, clock, RewardsConfig::default())
    }

    pub fn with_config(store: S, clock: C, config: RewardsConfig) -> Self {
        let milestones = config.milestone_set();
        Self {
            store,
            clock,
            config,
            milestones,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current total. Unreadable or malformed values read as 0.
    pub fn balance(&self) -> u64 {
        match load_balance(&self.store) {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "balance unreadable, showing 0");
                0
            }
        }
    }

    /// Current daily record for `kind`. Unreadable or malformed records read as empty.
    pub fn daily_state(&self, kind: ActivityKind) -> ActivityDailyState {
        match load_daily_state(&self.store, kind) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(activity = %kind, error = %e, "daily state unreadable");
                ActivityDailyState::default()
            }
        }
    }

    /// Award points for a saved journal entry.
    ///
    /// Entries shorter than the configured minimum word count earn nothing.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the new balance
    /// cannot be persisted. Nothing is credited in that case.
    pub fn award_journal_points(&self, word_count: u32) -> Result<AwardOutcome> {
        let min_words = self.config.journal_min_words;
        if word_count < min_words {
            tracing::debug!(word_count, min_words, "journal entry too short for points");
            return Ok(self.skipped(
                ActivityKind::Journal,
                SkipReason::TooShort {
                    word_count,
                    min_words,
                },
            ));
        }
        self.award(ActivityKind::Journal)
    }

    /// Award points for a finished mini-game.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub fn award_game_points(&self, is_completed: bool) -> Result<AwardOutcome> {
        if !is_completed {
            tracing::debug!("game not completed, no points");
            return Ok(self.skipped(ActivityKind::Game, SkipReason::NotCompleted));
        }
        self.award(ActivityKind::Game)
    }

    /// Milestone just crossed by `total`, under this ledger's milestone set.
    pub fn check_milestone(&self, total: u64) -> Option<u64> {
        self.milestones.check(total)
    }

    /// Add `amount` to the balance outside the daily bonus rules.
    ///
    /// Used for bulk adjustments such as corrections or imports. Returns the
    /// new total.
    pub fn credit(&self, amount: u64) -> Result<u64> {
        let _guard = self.lock()?;
        let mut credited = None;
        self.store.update(&mut |store| {
            let current = load_balance(store)?;
            let total = current.saturating_add(amount);
            if amount > 0 {
                store.set(BALANCE_KEY, &total.to_string())?;
            }
            credited = Some(total);
            Ok(())
        })?;
        let total = credited.ok_or_else(not_applied)?;
        if amount > 0 {
            tracing::info!(amount, total, "balance credited");
        }
        Ok(total)
    }

    /// Forget `kind`'s daily record so its next award pays the first bonus.
    pub fn reset_activity(&self, kind: ActivityKind) -> Result<()> {
        let _guard = self.lock()?;
        self.store.remove(kind.daily_key())?;
        tracing::info!(activity = %kind, "daily record reset");
        Ok(())
    }

    /// Remove the balance and every daily record, as on logout.
    pub fn wipe(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.store.update(&mut |store| {
            store.remove(BALANCE_KEY)?;
            for kind in ActivityKind::ALL {
                store.remove(kind.daily_key())?;
            }
            Ok(())
        })?;
        tracing::info!("rewards ledger wiped");
        Ok(())
    }

    fn award(&self, kind: ActivityKind) -> Result<AwardOutcome> {
        let _guard = self.lock()?;

        let today = self.clock.today();
        let policy = self.config.policy(kind);
        let mut applied = None;
        self.store.update(&mut |store| {
            let previous = load_daily_state(store, kind)?;
            let current = load_balance(store)?;

            let (award, state) = previous.next(today, policy);
            let first_of_day = previous.phase(today) != state.phase(today);
            let total = current.saturating_add(award);

            let state_json = serde_json::to_string(&state)?;
            let total_str = total.to_string();
            store.set_many(&[
                (kind.daily_key(), state_json.as_str()),
                (BALANCE_KEY, total_str.as_str()),
            ])?;
            applied = Some((award, total, first_of_day));
            Ok(())
        })?;
        let (award, total, first_of_day) = applied.ok_or_else(not_applied)?;

        let milestone = if award > 0 {
            self.milestones.check(total)
        } else {
            None
        };
        tracing::debug!(activity = %kind, award, total, first_of_day, "points awarded");
        if let Some(milestone) = milestone {
            tracing::info!(milestone, total, "milestone reached");
        }

        Ok(AwardOutcome {
            activity: kind,
            award,
            total,
            first_of_day,
            milestone,
            skipped: None,
        })
    }

    fn skipped(&self, kind: ActivityKind, reason: SkipReason) -> AwardOutcome {
        AwardOutcome {
            activity: kind,
            award: 0,
            total: self.balance(),
            first_of_day: false,
            milestone: None,
            skipped: Some(reason),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| CoreError::Custom(format!("Lock failed: {e}")))
    }
}

fn not_applied() -> CoreError {
    CoreError::Custom("store returned without running the update".into())
}

/// Read the total. I/O failures propagate; malformed values read as 0.
fn load_balance(store: &dyn KeyValueStore) -> Result<u64, StorageError> {
    let Some(raw) = store.get(BALANCE_KEY)? else {
        return Ok(0);
    };
    match raw.trim().parse::<u64>() {
        Ok(total) => Ok(total),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "malformed balance, treating as 0");
            Ok(0)
        }
    }
}

/// Read a daily record. I/O failures propagate; malformed records read as empty.
fn load_daily_state(
    store: &dyn KeyValueStore,
    kind: ActivityKind,
) -> Result<ActivityDailyState, StorageError> {
    let Some(raw) = store.get(kind.daily_key())? else {
        return Ok(ActivityDailyState::default());
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(activity = %kind, error = %e, "malformed daily state, resetting");
            Ok(ActivityDailyState::default())
        }
    }
}
