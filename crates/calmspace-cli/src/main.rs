use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "calmspace-cli", version, about = "Calmspace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Points, daily bonuses and milestones
    Points {
        /// Treat this date (YYYY-MM-DD) as today instead of reading the clock
        #[arg(long, global = true)]
        today: Option<chrono::NaiveDate>,
        #[command(subcommand)]
        action: commands::points::PointsAction,
    },
    /// Positive-mood streak from journal sentiments
    Streak(commands::streak::StreakArgs),
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
        Commands::Points { today, action } => commands::points::run(action, today),
        Commands::Streak(args) => commands::streak::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
