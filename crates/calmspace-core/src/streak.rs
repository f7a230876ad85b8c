//! Mood calendar and positive-mood streaks.
//!
//! Journal entries arrive tagged with a sentiment label. The calendar keeps the
//! latest sentiment per day and counts how many consecutive days, ending today,
//! were positive. A missing day breaks the streak just like a negative one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days examined when walking back from today.
pub const MAX_STREAK_LOOKBACK_DAYS: u32 = 365;

/// Sentiment labels attached to journal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Happy,
    Sad,
    Anxious,
    Angry,
    Grateful,
    Hopeful,
    Stressed,
    Lonely,
    Guilty,
    Conflicted,
}

impl Sentiment {
    pub fn is_positive(self) -> bool {
        matches!(self, Sentiment::Happy | Sentiment::Grateful | Sentiment::Hopeful)
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Happy => "😊",
            Sentiment::Sad => "😢",
            Sentiment::Anxious => "😰",
            Sentiment::Angry => "😡",
            Sentiment::Grateful => "🙏",
            Sentiment::Hopeful => "🌈",
            Sentiment::Stressed => "😩",
            Sentiment::Lonely => "😔",
            Sentiment::Guilty => "😓",
            Sentiment::Conflicted => "🤯",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Happy => "happy",
            Sentiment::Sad => "sad",
            Sentiment::Anxious => "anxious",
            Sentiment::Angry => "angry",
            Sentiment::Grateful => "grateful",
            Sentiment::Hopeful => "hopeful",
            Sentiment::Stressed => "stressed",
            Sentiment::Lonely => "lonely",
            Sentiment::Guilty => "guilty",
            Sentiment::Conflicted => "conflicted",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Sentiment::Happy),
            "sad" => Ok(Sentiment::Sad),
            "anxious" => Ok(Sentiment::Anxious),
            "angry" => Ok(Sentiment::Angry),
            "grateful" => Ok(Sentiment::Grateful),
            "hopeful" => Ok(Sentiment::Hopeful),
            "stressed" => Ok(Sentiment::Stressed),
            "lonely" => Ok(Sentiment::Lonely),
            "guilty" => Ok(Sentiment::Guilty),
            "conflicted" => Ok(Sentiment::Conflicted),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

/// One journal day and its sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub date: NaiveDate,
    pub sentiment: Sentiment,
}

/// Raw journal record as returned by the journal API.
///
/// Either field may be missing or unparseable; such records are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMoodRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// Per-day sentiment map, latest entry per day wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodCalendar {
    days: BTreeMap<NaiveDate, Sentiment>,
}

impl MoodCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = MoodEntry>,
    {
        let mut calendar = Self::new();
        for entry in entries {
            calendar.record(entry);
        }
        calendar
    }

    /// Build from raw records, skipping ones without a usable date or label.
    ///
    /// Dates may carry a time component (`2025-03-10T08:15:00Z`); only the
    /// leading `YYYY-MM-DD` is used.
    pub fn from_raw<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RawMoodRecord>,
    {
        let mut calendar = Self::new();
        for record in records {
            match parse_raw(record) {
                Some(entry) => calendar.record(entry),
                None => tracing::debug!(?record, "skipping unusable mood record"),
            }
        }
        calendar
    }

    pub fn record(&mut self, entry: MoodEntry) {
        self.days.insert(entry.date, entry.sentiment);
    }

    pub fn sentiment_on(&self, date: NaiveDate) -> Option<Sentiment> {
        self.days.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Consecutive positive days ending at `today` (inclusive).
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut cursor = today;
        while streak < MAX_STREAK_LOOKBACK_DAYS {
            match self.sentiment_on(cursor) {
                Some(sentiment) if sentiment.is_positive() => {
                    streak += 1;
                    cursor -= Duration::days(1);
                }
                _ => break,
            }
        }
        streak
    }

    /// Emoji per recorded day, for calendar markings.
    pub fn marked_days(&self) -> BTreeMap<NaiveDate, &'static str> {
        self.days
            .iter()
            .map(|(date, sentiment)| (*date, sentiment.emoji()))
            .collect()
    }
}

fn parse_raw(record: &RawMoodRecord) -> Option<MoodEntry> {
    let date_str = record.date.as_deref()?.trim();
    let date = NaiveDate::parse_from_str(date_str.get(..10)?, "%Y-%m-%d").ok()?;
    let sentiment = record.sentiment.as_deref()?.parse().ok()?;
    Some(MoodEntry { date, sentiment })
}
