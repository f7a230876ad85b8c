pub mod config;
pub mod points;
pub mod streak;

use calmspace_core::{Clock, Config, Database, FixedClock, RewardsLedger, SystemClock};
use chrono::NaiveDate;

pub type CliLedger = RewardsLedger<Database, Box<dyn Clock>>;

/// Clock pinned to `today` when given, otherwise the configured wall clock.
pub fn clock_for(config: &Config, today: Option<NaiveDate>) -> Box<dyn Clock> {
    match today {
        Some(date) => Box::new(FixedClock::new(date)),
        None => Box::new(SystemClock::from_config(&config.clock)),
    }
}

/// Open the ledger over the on-disk database with the configured policy.
pub fn open_ledger(
    config: &Config,
    today: Option<NaiveDate>,
) -> Result<CliLedger, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(RewardsLedger::with_config(
        db,
        clock_for(config, today),
        config.rewards.clone(),
    ))
}
