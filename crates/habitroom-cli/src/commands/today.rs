//! Daily commands: today's statuses, toggle, and the end-of-day report.

use chrono::Utc;
use habitroom_core::habits::Outcome;

use super::{open_tracker, print_json};

pub fn run_today(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let statuses = tracker.today_statuses(Utc::now())?;

    if json {
        return print_json(&statuses);
    }

    if statuses.is_empty() {
        println!("No active habits.");
        return Ok(());
    }

    for status in &statuses {
        let mark = if status.completed {
            "[x]"
        } else if status.skipped {
            "[-]"
        } else if status.applicable {
            "[ ]"
        } else {
            "   "
        };
        let mut line = format!(
            "{mark} {:<24} {:<20} streak {:>3}",
            status.habit.label, status.habit.key, status.streak
        );
        if status.missed_days > 0 {
            line.push_str(&format!("  missed {}", status.missed_days));
        }
        if let Some(reason) = &status.skip_reason {
            line.push_str(&format!("  skipped: {reason}"));
        }
        if !status.applicable {
            line.push_str("  (not today)");
        }
        println!("{line}");
    }
    Ok(())
}

pub fn run_toggle(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let outcome = tracker.toggle(key, Utc::now())?;

    if outcome.completed {
        println!("{key}: done");
    } else {
        println!("{key}: not done");
    }
    if let Some(days) = outcome.milestone {
        println!("Milestone reached: {days}-day streak");
    }
    Ok(())
}

pub fn run_report(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let report = tracker.day_report(Utc::now())?;

    if json {
        return print_json(&report);
    }

    println!(
        "Habit report for {}: {}/{} ({}%)",
        report.date, report.completed, report.total, report.score_percent
    );
    for entry in &report.entries {
        let outcome = match &entry.outcome {
            Outcome::Completed => "done".to_string(),
            Outcome::Skipped { reason: Some(reason) } => format!("skipped ({reason})"),
            Outcome::Skipped { reason: None } => "skipped".to_string(),
            Outcome::Missed => "missed".to_string(),
        };
        let flag = if entry.critical { " !" } else { "" };
        println!("  {:<24} {outcome}{flag}", entry.label);
    }

    let critical = report.missed_critical();
    if !critical.is_empty() {
        let labels: Vec<&str> = critical.iter().map(|e| e.label.as_str()).collect();
        println!("Missed critical: {}", labels.join(", "));
    }
    Ok(())
}
