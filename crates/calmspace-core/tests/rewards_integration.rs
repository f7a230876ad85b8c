//! Integration tests for the rewards ledger over real and failing stores.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use calmspace_core::{
    check_milestone, ActivityDailyState, ActivityKind, Clock, CoreError, Database, FixedClock,
    KeyValueStore, MemoryStore, RewardsLedger, StorageError,
};
use chrono::NaiveDate;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

/// Store that can be told to reject reads or writes.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: "bad sector".into(),
            });
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                key: entries[0].0.to_string(),
                message: "disk full".into(),
            });
        }
        self.inner.set_many(entries)
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        f(self)
    }
}

#[test]
fn test_daily_scenario_across_two_days() {
    let ledger = RewardsLedger::new(MemoryStore::new(), FixedClock::new(day(10)));

    let journal = ledger.award_journal_points(25).unwrap();
    assert_eq!((journal.award, journal.total), (10, 10));

    let game = ledger.award_game_points(true).unwrap();
    assert_eq!((game.award, game.total), (5, 15));

    let journal_again = ledger.award_journal_points(30).unwrap();
    assert_eq!((journal_again.award, journal_again.total), (5, 20));

    ledger.clock().advance_days(1);
    let game_next_day = ledger.award_game_points(true).unwrap();
    assert_eq!((game_next_day.award, game_next_day.total), (5, 25));

    assert_eq!(ledger.balance(), 25);
    assert_eq!(ledger.balance(), 25);
}

#[test]
fn test_balance_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calmspace.db");

    {
        let db = Database::open_at(&path).unwrap();
        let ledger = RewardsLedger::new(db, FixedClock::new(day(10)));
        ledger.award_journal_points(40).unwrap();
        ledger.award_journal_points(40).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let ledger = RewardsLedger::new(db, FixedClock::new(day(10)));
    assert_eq!(ledger.balance(), 15);
    let state = ledger.daily_state(ActivityKind::Journal);
    assert_eq!(state.last_reward_date, Some(day(10)));
    assert_eq!(state.count, 2);

    // Same day after restart still pays the repeat bonus.
    assert_eq!(ledger.award_journal_points(40).unwrap().award, 5);
}

#[test]
fn test_stored_layout() {
    let db = Database::open_memory().unwrap();
    let ledger = RewardsLedger::new(&db, FixedClock::new(day(10)));
    ledger.award_game_points(true).unwrap();

    assert_eq!(db.get("points.total").unwrap().as_deref(), Some("5"));
    let raw = db.get("points.game.daily").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["date"], "2025-06-10");
    assert_eq!(json["first_bonus_given"], true);
    assert!(db.get("points.journal.daily").unwrap().is_none());
}

#[test]
fn test_concurrent_double_tap_pays_first_bonus_once() {
    let ledger = Arc::new(RewardsLedger::new(
        MemoryStore::new(),
        FixedClock::new(day(10)),
    ));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ledger.award_journal_points(50).unwrap().award
            })
        })
        .collect();

    let mut awards: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    awards.sort_unstable();

    assert_eq!(awards.iter().filter(|&&a| a == 10).count(), 1);
    assert_eq!(awards.iter().filter(|&&a| a == 5).count(), 7);
    assert_eq!(ledger.balance(), 10 + 7 * 5);
    assert_eq!(ledger.daily_state(ActivityKind::Journal).count, 8);
}

#[test]
fn test_write_failure_is_reported_and_nothing_changes() {
    let store = FlakyStore::default();
    let ledger = RewardsLedger::new(&store, FixedClock::new(day(10)));
    ledger.award_journal_points(30).unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    let err = ledger.award_game_points(true).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(ledger.balance(), 10);
    assert_eq!(
        ledger.daily_state(ActivityKind::Game).last_reward_date,
        None
    );

    // Once storage recovers the game still gets its first bonus.
    store.fail_writes.store(false, Ordering::SeqCst);
    let game = ledger.award_game_points(true).unwrap();
    assert_eq!((game.award, game.total), (5, 15));
}

#[test]
fn test_read_failure_aborts_award_and_display_falls_back() {
    let store = FlakyStore::default();
    let ledger = RewardsLedger::new(&store, FixedClock::new(day(10)));
    ledger.award_journal_points(30).unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);
    assert_eq!(ledger.balance(), 0);
    assert_eq!(
        ledger.daily_state(ActivityKind::Journal),
        ActivityDailyState::default()
    );

    let err = ledger.award_game_points(true).unwrap_err();
    assert!(err.to_string().contains("bad sector"));
    assert!(ledger.award_journal_points(30).is_err());
    assert!(ledger.credit(100).is_err());

    // The unreadable balance was not overwritten with `0 + award`.
    store.fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(store.inner.get("points.total").unwrap().as_deref(), Some("10"));
    assert_eq!(ledger.daily_state(ActivityKind::Journal).count, 1);
    assert_eq!(ledger.daily_state(ActivityKind::Game).last_reward_date, None);
}

#[test]
fn test_skipped_awards_do_not_touch_storage_even_when_failing() {
    let store = FlakyStore::default();
    store.fail_writes.store(true, Ordering::SeqCst);
    let ledger = RewardsLedger::new(&store, FixedClock::new(day(10)));

    let outcome = ledger.award_journal_points(5).unwrap();
    assert_eq!(outcome.award, 0);
    let outcome = ledger.award_game_points(false).unwrap();
    assert_eq!(outcome.award, 0);
}

#[test]
fn test_milestone_walk_with_daily_awards() {
    let ledger = RewardsLedger::new(MemoryStore::new(), FixedClock::new(day(1)));
    let mut celebrated = Vec::new();

    // One journal and one game a day: 15 points per day.
    for _ in 0..40 {
        for outcome in [
            ledger.award_journal_points(100).unwrap(),
            ledger.award_game_points(true).unwrap(),
        ] {
            if let Some(m) = outcome.milestone {
                celebrated.push((m, outcome.total));
            }
            assert_eq!(outcome.milestone, check_milestone(outcome.total));
        }
        ledger.clock().advance_days(1);
    }

    assert_eq!(ledger.balance(), 600);
    assert!(celebrated.iter().any(|&(m, _)| m == 75));
    assert!(celebrated.iter().any(|&(m, _)| m == 500));
    assert!(celebrated.iter().all(|&(m, total)| total - m < 20));
}

#[test]
fn test_clock_is_read_per_award() {
    let clock = FixedClock::new(day(10));
    let ledger = RewardsLedger::new(MemoryStore::new(), &clock);
    assert_eq!(ledger.award_game_points(true).unwrap().award, 5);
    clock.set(day(11));
    assert_eq!(ledger.clock().today(), day(11));
    assert_eq!(ledger.award_game_points(true).unwrap().award, 5);
    assert_eq!(ledger.award_game_points(true).unwrap().award, 2);
}

/// Award `kind` `rounds` times from each of `workers` threads, every thread
/// with its own connection to the database at `path`.
fn award_from_separate_connections(
    path: &Path,
    kind: ActivityKind,
    workers: usize,
    rounds: usize,
) -> Vec<u64> {
    // Create the schema before the workers race to open the file.
    Database::open_at(path).unwrap();
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let path: PathBuf = path.to_path_buf();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open_at(&path).unwrap();
                let ledger = RewardsLedger::new(db, FixedClock::new(day(10)));
                barrier.wait();
                (0..rounds)
                    .map(|_| {
                        let outcome = match kind {
                            ActivityKind::Journal => ledger.award_journal_points(50),
                            ActivityKind::Game => ledger.award_game_points(true),
                        };
                        outcome.unwrap().award
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn test_separate_connections_never_lose_game_awards() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calmspace.db");

    let awards = award_from_separate_connections(&path, ActivityKind::Game, 4, 10);

    assert_eq!(awards.len(), 40);
    assert_eq!(awards.iter().filter(|&&a| a == 5).count(), 1);
    assert_eq!(awards.iter().filter(|&&a| a == 2).count(), 39);

    let ledger = RewardsLedger::new(Database::open_at(&path).unwrap(), FixedClock::new(day(10)));
    assert_eq!(ledger.balance(), awards.iter().sum::<u64>());
    assert_eq!(ledger.balance(), 5 + 39 * 2);
    assert_eq!(ledger.daily_state(ActivityKind::Game).count, 40);
}

#[test]
fn test_separate_connections_pay_journal_first_bonus_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calmspace.db");

    let awards = award_from_separate_connections(&path, ActivityKind::Journal, 3, 5);

    assert_eq!(awards.iter().filter(|&&a| a == 10).count(), 1);
    assert_eq!(awards.iter().filter(|&&a| a == 5).count(), 14);

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.get("points.total").unwrap().as_deref(), Some("80"));
}
