mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "watt")]
#[command(about = "Household appliance usage logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start tracking an appliance
    Start {
        /// Appliance name (unknown names are added to the catalog)
        appliance: String,
        /// Optional notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Certainty (1 = unsure, 5 = sure)
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
        certainty: u8,
    },
    /// Stop a running appliance and save the session
    Stop {
        /// Appliance name
        appliance: String,
    },
    /// Show currently running appliances
    Status,
    /// Add a finished session manually
    Add {
        /// Appliance name (unknown names are added to the catalog)
        appliance: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,
        /// Start time (HH:MM or HH:MM:SS)
        #[arg(long)]
        start_time: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
        /// End time (HH:MM or HH:MM:SS)
        #[arg(long)]
        end_time: String,
        /// Optional notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Certainty (1 = unsure, 5 = sure)
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
        certainty: u8,
    },
    /// Appliance catalog commands
    Appliances {
        #[command(subcommand)]
        action: AppliancesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Test the connection to the remote session store
    Test,
}

#[derive(Subcommand, Debug)]
enum AppliancesAction {
    /// List known appliances in display order
    List,
    /// Add an appliance to the catalog
    Add {
        /// Appliance name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g. `sink.url`)
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. `sink.api_key`)
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Commands::Start {
            appliance,
            notes,
            certainty,
        } => commands::session::handle_start(&appliance, &notes, certainty),
        Commands::Stop { appliance } => commands::session::handle_stop(&appliance).await,
        Commands::Status => commands::session::handle_status(),
        Commands::Add {
            appliance,
            start_date,
            start_time,
            end_date,
            end_time,
            notes,
            certainty,
        } => {
            commands::session::handle_add(
                &appliance,
                (&start_date, &start_time),
                (&end_date, &end_time),
                &notes,
                certainty,
            )
            .await
        }
        Commands::Appliances { action } => match action {
            AppliancesAction::List => commands::appliances::handle_list(),
            AppliancesAction::Add { name } => commands::appliances::handle_add(&name),
        },
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => commands::config::handle_config_get(&key),
            ConfigAction::Set { key, value } => commands::config::handle_config_set(&key, &value),
            ConfigAction::List => commands::config::handle_config_list(),
        },
        Commands::Test => commands::session::handle_test().await,
    }
}
