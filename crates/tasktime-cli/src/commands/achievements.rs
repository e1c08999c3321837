use clap::Subcommand;
use serde_json::json;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List every achievement with progress
    List {
        /// Only unlocked entries
        #[arg(long)]
        unlocked: bool,
    },
    /// Re-evaluate and print newly unlocked achievements
    Check,
    /// Clear all unlocks and progress
    Reset,
}

pub fn run(action: AchievementsAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        AchievementsAction::List { unlocked } => {
            let all: Vec<_> = tracker
                .achievements()
                .achievements()
                .into_iter()
                .filter(|a| !unlocked || a.unlocked)
                .collect();
            print_json(&all)?;
        }
        AchievementsAction::Check => {
            let events = tracker.check_achievements()?;
            print_json(&events)?;
        }
        AchievementsAction::Reset => {
            tracker.reset_achievements()?;
            print_json(&json!({ "type": "achievements_reset" }))?;
        }
    }
    Ok(())
}
