//! Category management commands for CLI.

use clap::Subcommand;
use tasktime_core::task::{CategoryColor, CategoryUpdate};
use tasktime_core::NewCategory;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories
    List,
    /// Create a custom category
    Create {
        /// Category name
        name: String,
        /// Background color
        #[arg(long, default_value = "#7A85FF")]
        bg: String,
        /// Text color
        #[arg(long, default_value = "#FFFFFF")]
        text: String,
        /// Icon
        #[arg(long, default_value = "📁")]
        icon: String,
    },
    /// Update a category
    Update {
        /// Category ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Background color (requires --text)
        #[arg(long, requires = "text")]
        bg: Option<String>,
        /// Text color (requires --bg)
        #[arg(long, requires = "bg")]
        text: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a custom category; its tasks move to the first default category
    Delete {
        /// Category ID
        id: String,
    },
}

pub fn run(action: CategoryAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        CategoryAction::List => {
            print_json(tracker.repository().categories())?;
        }
        CategoryAction::Create {
            name,
            bg,
            text,
            icon,
        } => {
            let id = tracker.add_category(NewCategory {
                name,
                color: CategoryColor::new(&bg, &text),
                icon,
            })?;
            print_json(tracker.repository().category(&id)?)?;
        }
        CategoryAction::Update {
            id,
            name,
            bg,
            text,
            icon,
        } => {
            let color = match (bg, text) {
                (Some(bg), Some(text)) => Some(CategoryColor::new(&bg, &text)),
                _ => None,
            };
            tracker.update_category(&id, CategoryUpdate { name, color, icon })?;
            print_json(tracker.repository().category(&id)?)?;
        }
        CategoryAction::Delete { id } => {
            tracker.delete_category(&id)?;
            print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
        }
    }
    Ok(())
}
