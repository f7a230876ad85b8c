//! # Calmspace Core Library
//!
//! This library provides the client-side gamification logic for the Calmspace
//! wellness app. Screens, networking and journal analysis live elsewhere; this
//! crate only turns user activity into points and streaks and keeps them
//! durable between launches. The `calmspace-cli` binary exposes every
//! operation for scripting and support work.
//!
//! ## Architecture
//!
//! - **Rewards**: per-activity daily bonus rules, the point balance and
//!   milestone detection, over an abstract key-value store and clock
//! - **Streaks**: positive-mood streaks computed from journal sentiments
//! - **Storage**: SQLite key-value storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RewardsLedger`]: awards points and persists the balance
//! - [`MoodCalendar`]: per-day sentiment map and streak counting
//! - [`Database`]: durable [`KeyValueStore`]
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod rewards;
pub mod storage;
pub mod streak;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, PointsToast};
pub use rewards::{
    check_milestone, ActivityDailyState, ActivityKind, AwardOutcome, DailyPhase, MilestoneSet,
    RewardPolicy, RewardsLedger, SkipReason,
};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use streak::{MoodCalendar, MoodEntry, RawMoodRecord, Sentiment};
