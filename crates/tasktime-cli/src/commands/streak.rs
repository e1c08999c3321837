use clap::Subcommand;
use serde_json::json;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Check in for today
    CheckIn,
    /// Show current and longest streak
    Show,
    /// Zero the current streak (the longest is kept)
    Reset,
}

pub fn run(action: StreakAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        StreakAction::CheckIn => {
            let (outcome, events) = tracker.check_in()?;
            print_json(&json!({
                "outcome": outcome,
                "streak": tracker.streak().info(),
                "events": events,
            }))?;
        }
        StreakAction::Show => {
            print_json(&tracker.streak().info())?;
        }
        StreakAction::Reset => {
            tracker.reset_streak()?;
            print_json(&tracker.streak().info())?;
        }
    }
    Ok(())
}
