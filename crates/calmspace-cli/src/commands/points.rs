use clap::Subcommand;
use serde::Serialize;

use calmspace_core::{ActivityKind, AwardOutcome, Clock, Config, PointsToast};

use super::open_ledger;

#[derive(Subcommand)]
pub enum PointsAction {
    /// Show the current balance
    Balance,
    /// Award points for a saved journal entry
    Journal {
        /// Number of words in the entry
        #[arg(long)]
        words: u32,
    },
    /// Award points for a mini-game
    Game {
        /// The game was abandoned before the end
        #[arg(long)]
        incomplete: bool,
    },
    /// Check which milestone a total has just crossed
    Milestone {
        /// Point total to check
        total: u64,
    },
    /// Show the daily bonus record for an activity (journal or game)
    State { kind: ActivityKind },
    /// Add points outside the daily bonus rules
    Credit { amount: u64 },
    /// Forget an activity's daily record
    Reset { kind: ActivityKind },
    /// Remove the balance and all daily records
    Wipe,
}

#[derive(Serialize)]
struct AwardReport {
    #[serde(flatten)]
    outcome: AwardOutcome,
    toast: Option<PointsToast>,
}

#[derive(Serialize)]
struct BalanceReport {
    total: u64,
    milestone: Option<u64>,
}

pub fn run(
    action: PointsAction,
    today: Option<chrono::NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = open_ledger(&config, today)?;

    match action {
        PointsAction::Balance => {
            let total = ledger.balance();
            let report = BalanceReport {
                total,
                milestone: ledger.check_milestone(total),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PointsAction::Journal { words } => {
            let outcome = ledger
                .award_journal_points(words)
                .map_err(|e| format!("reward could not be recorded: {e}"))?;
            print_award(&config, outcome)?;
        }
        PointsAction::Game { incomplete } => {
            let outcome = ledger
                .award_game_points(!incomplete)
                .map_err(|e| format!("reward could not be recorded: {e}"))?;
            print_award(&config, outcome)?;
        }
        PointsAction::Milestone { total } => {
            let report = BalanceReport {
                total,
                milestone: ledger.check_milestone(total),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PointsAction::State { kind } => {
            let state = ledger.daily_state(kind);
            let phase = state.phase(ledger.clock().today());
            let json = serde_json::json!({
                "activity": kind,
                "state": state,
                "phase": phase,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        PointsAction::Credit { amount } => {
            let total = ledger.credit(amount)?;
            let report = BalanceReport {
                total,
                milestone: ledger.check_milestone(total),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PointsAction::Reset { kind } => {
            ledger.reset_activity(kind)?;
            println!("{kind} daily record reset");
        }
        PointsAction::Wipe => {
            ledger.wipe()?;
            println!("points wiped");
        }
    }
    Ok(())
}

fn print_award(config: &Config, outcome: AwardOutcome) -> Result<(), Box<dyn std::error::Error>> {
    let toast = if config.notifications.enabled {
        outcome.toast(config.notifications.toast_duration_ms)
    } else {
        None
    };
    let report = AwardReport { outcome, toast };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
