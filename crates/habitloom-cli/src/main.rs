use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habitloom", version, about = "Habitloom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Category management
    Category {
        #[command(subcommand)]
        action: commands::habit::CategoryAction,
    },
    /// Daily progress: increments, undo, skips and mood
    Track {
        #[command(subcommand)]
        action: commands::track::TrackAction,
    },
    /// Habit timers
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Aggregated statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Week and month views
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Category { action } => commands::habit::run_category(action),
        Commands::Track { action } => commands::track::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Calendar { action } => commands::calendar::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
