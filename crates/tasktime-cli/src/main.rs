use clap::{Parser, Subcommand};
use tasktime_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tasktime", version, about = "Task and time tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Category management
    Category {
        #[command(subcommand)]
        action: commands::category::CategoryAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Time statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Daily check-in streak
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Achievements
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKTIME_LOG")
        .unwrap_or_else(|_| EnvFilter::new(Config::load_or_default().logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Category { action } => commands::category::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
