pub mod achievements;
pub mod category;
pub mod config;
pub mod stats;
pub mod streak;
pub mod task;
pub mod timer;

use serde::Serialize;
use tasktime_core::{Config, Tracker};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the tracker with the on-disk configuration.
pub fn open_tracker() -> Result<Tracker, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    Ok(Tracker::open(config)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
