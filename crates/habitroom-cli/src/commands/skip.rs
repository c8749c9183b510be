//! Skip day commands for CLI.

use clap::Subcommand;
use habitroom_core::calendar::parse_date;

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum SkipAction {
    /// Add a skip day
    Add {
        /// Date as YYYY-MM-DD
        date: String,
        /// Why the day is skipped
        reason: String,
        /// Also skip the following day as a recovery day
        #[arg(long)]
        recovery: bool,
    },
    /// List skip days
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove a skip day by id
    Remove {
        id: i64,
    },
}

pub fn run(action: SkipAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        SkipAction::Add {
            date,
            reason,
            recovery,
        } => {
            let date = parse_date(&date)?;
            for day in tracker.add_skip_day(date, &reason, recovery)? {
                println!("Skip day added: {} {} ({})", day.id, day.date, day.reason);
            }
        }
        SkipAction::List { json } => {
            let days = tracker.skip_days()?;
            if json {
                return print_json(&days);
            }
            for day in &days {
                let recovery = if day.auto_recovery { "  +recovery" } else { "" };
                println!("{:>4}  {}  {}{recovery}", day.id, day.date, day.reason);
            }
        }
        SkipAction::Remove { id } => {
            if !tracker.delete_skip_day(id)? {
                return Err(format!("no skip day with id {id}").into());
            }
            println!("Skip day removed: {id}");
        }
    }
    Ok(())
}
