use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use tasktime_core::time::{day_key_for, format_time};

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// Seconds per day for a Sunday-to-Saturday week
    Week {
        /// Any day in the week (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Seconds recorded on one day
    Day {
        /// Day (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// All-time summary
    All,
}

pub fn run(action: StatsAction) -> CliResult {
    let tracker = open_tracker()?;
    let repo = tracker.repository();

    match action {
        StatsAction::Today => {
            let total = repo.total_time_today();
            print_json(&json!({
                "day": day_key_for(repo.today()),
                "totalTimeToday": total,
                "formatted": format_time(total),
                "completedTasksToday": repo.completed_tasks_today(),
            }))?;
        }
        StatsAction::Week { date } => {
            let date = date.unwrap_or_else(|| repo.today());
            let days = repo.time_spent_by_week(date);
            let total: u64 = days.values().sum();
            print_json(&json!({
                "week": days.keys().next(),
                "days": days,
                "total": total,
                "formatted": format_time(total),
            }))?;
        }
        StatsAction::Day { date } => {
            let total = repo.time_spent_on_day(date);
            let tasks: Vec<_> = repo.tasks_by_day(date).iter().map(|t| t.id.clone()).collect();
            print_json(&json!({
                "day": day_key_for(date),
                "timeSpent": total,
                "formatted": format_time(total),
                "taskIds": tasks,
            }))?;
        }
        StatsAction::All => {
            print_json(&repo.summary())?;
        }
    }
    Ok(())
}
