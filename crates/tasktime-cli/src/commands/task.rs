//! Task management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use tasktime_core::{NewTask, TaskUpdate, TimerMethod};

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task name
        name: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Category ID (default: first category)
        #[arg(long)]
        category: Option<String>,
        /// Timer method: regular, pomodoro or fiveMin
        #[arg(long, default_value = "regular")]
        method: TimerMethod,
    },
    /// List tasks
    List {
        /// Filter by category ID
        #[arg(long)]
        category: Option<String>,
        /// Only tasks with a session on this day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
        /// New category ID
        #[arg(long)]
        category: Option<String>,
        /// New timer method
        #[arg(long)]
        method: Option<TimerMethod>,
    },
    /// Delete a task and its sessions
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        TaskAction::Create {
            name,
            description,
            category,
            method,
        } => {
            let mut input = NewTask::new(name).with_method(method);
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if let Some(category) = category {
                input = input.with_category(category);
            }
            let id = tracker.add_task(input)?;
            print_json(tracker.repository().task(&id)?)?;
        }
        TaskAction::List { category, day } => {
            let repo = tracker.repository();
            let tasks: Vec<_> = match day {
                Some(day) => repo.tasks_by_day(day),
                None => repo.tasks().iter().collect(),
            };
            let filtered: Vec<_> = tasks
                .into_iter()
                .filter(|t| category.as_deref().map_or(true, |c| t.category_id == c))
                .collect();
            print_json(&filtered)?;
        }
        TaskAction::Get { id } => {
            print_json(tracker.repository().task(&id)?)?;
        }
        TaskAction::Update {
            id,
            name,
            description,
            category,
            method,
        } => {
            let update = TaskUpdate {
                name,
                description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
                category_id: category,
                timer_method: method,
            };
            if update.is_empty() {
                return Err("nothing to update".into());
            }
            tracker.update_task(&id, update)?;
            print_json(tracker.repository().task(&id)?)?;
        }
        TaskAction::Delete { id } => {
            let deleted = tracker.delete_task(&id)?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))?;
        }
    }
    Ok(())
}
