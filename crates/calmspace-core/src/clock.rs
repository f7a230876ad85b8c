//! Calendar clock used to decide which day an award belongs to.

use std::sync::Mutex;

use chrono::{Duration, FixedOffset, Local, NaiveDate, Utc};

use crate::storage::ClockConfig;

/// Source of "today" for day-boundary reward rules.
pub trait Clock {
    /// Current calendar date in the user's time zone.
    fn today(&self) -> NaiveDate;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Wall clock, in the system local time zone or a fixed UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Clock pinned to a fixed offset from UTC.
    ///
    /// Offsets outside +/- 24h are ignored and local time is used instead.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        if offset.is_none() {
            tracing::warn!(minutes, "ignoring out-of-range UTC offset");
        }
        Self { offset }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        match config.utc_offset_minutes {
            Some(minutes) => Self::with_offset_minutes(minutes),
            None => Self::local(),
        }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut current) = self.date.lock() {
            *current = date;
        }
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        if let Ok(mut current) = self.date.lock() {
            *current += Duration::days(days);
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.date.lock() {
            Ok(date) => *date,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_clock_advances_across_month_end() {
        let clock = FixedClock::new(date(2024, 2, 28));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2024, 2, 29));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2024, 3, 1));
    }

    #[test]
    fn fixed_clock_set() {
        let clock = FixedClock::new(date(2024, 1, 1));
        clock.set(date(2025, 6, 15));
        assert_eq!(clock.today(), date(2025, 6, 15));
    }

    #[test]
    fn offset_clock_tracks_utc_shift() {
        let utc_today = Utc::now().date_naive();
        let east = SystemClock::with_offset_minutes(14 * 60).today();
        let west = SystemClock::with_offset_minutes(-12 * 60).today();
        assert!(east >= utc_today);
        assert!(west <= utc_today);
        assert!((east - west).num_days() <= 2);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_local() {
        let clock = SystemClock::with_offset_minutes(48 * 60);
        assert!(clock.offset.is_none());
    }
}
