use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tasa::core::log::init_logging;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for tasa::AppCommand {
    fn from(cmd: Commands) -> tasa::AppCommand {
        match cmd {
            Commands::Serve => tasa::AppCommand::Serve,
            Commands::Show => tasa::AppCommand::Show,
            Commands::Convert { amount } => tasa::AppCommand::Convert { amount_eur: amount },
            Commands::Setup { .. } => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Serve the rate endpoints
    Serve,
    /// Display current EUR, USD and local currency rates
    Show,
    /// Convert an amount in EUR to USD
    Convert {
        /// Amount in EUR
        amount: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, quiet_level);

    let result = match cli.command {
        Some(Commands::Setup { force }) => tasa::cli::setup::setup(force).map(|path| {
            println!("Configuration written to {}", path.display());
        }),
        Some(cmd) => tasa::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
