//! Mood streak command over an exported list of journal records.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use calmspace_core::{Clock, Config, MoodCalendar, RawMoodRecord};

use super::clock_for;

#[derive(Args)]
pub struct StreakArgs {
    /// JSON file holding an array of {"date": ..., "sentiment": ...} records
    #[arg(long)]
    file: PathBuf,
    /// Count the streak back from this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Include the per-day emoji markings
    #[arg(long)]
    marks: bool,
}

#[derive(Serialize)]
struct StreakReport {
    today: NaiveDate,
    streak: u32,
    days_recorded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    marks: Option<BTreeMap<NaiveDate, &'static str>>,
}

pub fn run(args: StreakArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read {}: {e}", args.file.display()))?;
    let records: Vec<RawMoodRecord> = serde_json::from_str(&content)?;
    let calendar = MoodCalendar::from_raw(&records);

    let today = match args.today {
        Some(date) => date,
        None => clock_for(&Config::load_or_default(), None).today(),
    };

    let report = StreakReport {
        today,
        streak: calendar.current_streak(today),
        days_recorded: calendar.len(),
        marks: args.marks.then(|| calendar.marked_days()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
