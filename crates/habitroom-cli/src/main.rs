use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitroom-cli", version, about = "Habitroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's habits with streaks and missed days
    Today {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a habit done for today, or undo it
    Toggle {
        /// Habit key
        key: String,
    },
    /// End-of-day summary
    Report {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Skip day management
    Skip {
        #[command(subcommand)]
        action: commands::skip::SkipAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Today { json } => commands::today::run_today(json),
        Commands::Toggle { key } => commands::today::run_toggle(&key),
        Commands::Report { json } => commands::today::run_report(json),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Skip { action } => commands::skip::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
