pub mod config;
pub mod habit;
pub mod skip;
pub mod today;

use habitroom_core::{Config, Database, HabitTracker};

/// Open the data-directory database with the configured calendar and windows.
pub fn open_tracker() -> Result<HabitTracker<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    tracing::debug!(timezone = %config.timezone, "database opened");
    Ok(HabitTracker::from_config(db, &config)?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
