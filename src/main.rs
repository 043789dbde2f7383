use anyhow::Result;
use clap::{Parser, Subcommand};

use panoptes::cli::{self, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "panoptes")]
#[command(about = "Configure the Panoptes blockchain-event monitor backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show backend setup status
    Status {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Poll every N seconds and print changes
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Test a provider endpoint and API key without saving
    Validate {
        /// gRPC endpoint of the data provider
        #[arg(long)]
        endpoint: String,
        /// Network the credential is for (e.g. mainnet, preprod)
        #[arg(long)]
        network: String,
        /// Provider API key
        #[arg(long, env = "PANOPTES_API_KEY", hide_env_values = true, default_value = "")]
        api_key: String,
    },
    /// Test a provider endpoint and API key, then save them if the test passes
    Configure {
        /// gRPC endpoint of the data provider
        #[arg(long)]
        endpoint: String,
        /// Network the credential is for (e.g. mainnet, preprod)
        #[arg(long)]
        network: String,
        /// Provider API key
        #[arg(long, env = "PANOPTES_API_KEY", hide_env_values = true, default_value = "")]
        api_key: String,
    },
    /// Switch the backend's active network
    Switch {
        /// Target network
        network: String,
    },
    /// Delete the stored provider credentials on the backend
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show recorded setup operations
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage the panoptes configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.panoptes/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `backend.base_url https://panoptes.example`
    Set { key: String, value: String },
    /// Restore the default config
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Status { format, watch } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_status(fmt, watch)
        }
        Commands::Validate {
            endpoint,
            network,
            api_key,
        } => cli::run_validate(&endpoint, &api_key, &network),
        Commands::Configure {
            endpoint,
            network,
            api_key,
        } => cli::run_configure(&endpoint, &api_key, &network),
        Commands::Switch { network } => cli::run_switch(&network),
        Commands::Clear { yes } => cli::run_clear(yes),
        Commands::History { format, days } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
