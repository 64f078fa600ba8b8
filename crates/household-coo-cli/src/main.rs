use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "household-coo", version, about = "Household COO CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task inspection and triage
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Top task for importance, urgency and savings
    Spotlight(commands::spotlight::SpotlightArgs),
    /// AI-credit budget
    Budget {
        #[command(subcommand)]
        action: commands::budget::BudgetAction,
    },
    /// Buy step-by-step instructions for a task
    Instructions(commands::instructions::InstructionsArgs),
    /// Gmail and WhatsApp connection switches
    Integrations {
        #[command(subcommand)]
        action: commands::integrations::IntegrationsAction,
    },
    /// Sync, export, import and reset of stored data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Relational record store
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Spotlight(args) => commands::spotlight::run(args),
        Commands::Budget { action } => commands::budget::run(action),
        Commands::Instructions(args) => commands::instructions::run(args),
        Commands::Integrations { action } => commands::integrations::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Db { action } => commands::db::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
