//! Habit management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use habitroom_core::habits::{HabitPatch, NewHabit, Recurrence};

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum HabitAction {
    /// List habits
    List {
        /// Include deactivated habits
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Add a habit
    Add {
        /// Display label; the key is derived from it
        label: String,
        /// Comma-separated weekdays, 0 = Sunday (default: every day)
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,
        /// Excused on skip days
        #[arg(long)]
        skippable: bool,
        /// Flagged in the end-of-day report when missed
        #[arg(long)]
        critical: bool,
    },
    /// Update a habit
    Update {
        /// Habit key
        key: String,
        #[arg(long)]
        label: Option<String>,
        /// Comma-separated weekdays, 0 = Sunday
        #[arg(long, value_delimiter = ',', conflicts_with = "daily")]
        days: Option<Vec<u8>>,
        /// Make the habit apply every day
        #[arg(long)]
        daily: bool,
        #[arg(long)]
        skippable: Option<bool>,
        #[arg(long)]
        critical: Option<bool>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        sort_order: Option<i64>,
    },
    /// Deactivate a habit; its history is kept
    Remove {
        /// Habit key
        key: String,
    },
}

fn recurrence_from(days: Vec<u8>) -> Result<Recurrence, Box<dyn std::error::Error>> {
    if days.is_empty() {
        Ok(Recurrence::Daily)
    } else {
        Ok(Recurrence::weekdays(days)?)
    }
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        HabitAction::List { all, json } => {
            let habits = tracker.habits(!all)?;
            if json {
                return print_json(&habits);
            }
            for habit in &habits {
                let days = match &habit.recurrence {
                    Recurrence::Daily => "daily".to_string(),
                    Recurrence::Weekdays(_) => habit
                        .recurrence
                        .days()
                        .iter()
                        .map(u8::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                };
                let mut flags = Vec::new();
                if habit.skippable {
                    flags.push("skippable");
                }
                if habit.critical {
                    flags.push("critical");
                }
                if !habit.active {
                    flags.push("inactive");
                }
                println!(
                    "{:<20} {:<24} {:<14} {}",
                    habit.key,
                    habit.label,
                    days,
                    flags.join(" ")
                );
            }
        }
        HabitAction::Add {
            label,
            days,
            skippable,
            critical,
        } => {
            let new_habit = NewHabit {
                label,
                recurrence: recurrence_from(days)?,
                skippable,
                critical,
            };
            let habit = tracker.create_habit(new_habit, Utc::now())?;
            println!("Habit created: {}", habit.key);
        }
        HabitAction::Update {
            key,
            label,
            days,
            daily,
            skippable,
            critical,
            active,
            sort_order,
        } => {
            let recurrence = if daily {
                Some(Recurrence::Daily)
            } else {
                days.map(Recurrence::weekdays).transpose()?
            };
            let patch = HabitPatch {
                label,
                recurrence,
                skippable,
                critical,
                active,
                sort_order,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            tracker.update_habit(&key, patch)?;
            println!("Habit updated: {key}");
        }
        HabitAction::Remove { key } => {
            tracker.delete_habit(&key)?;
            println!("Habit removed: {key}");
        }
    }
    Ok(())
}
