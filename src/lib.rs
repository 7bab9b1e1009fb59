pub mod cli;
pub mod core;
pub mod presenter;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::presenter::format::Locale;
use anyhow::{Context, Result};
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Show,
    Convert { amount_eur: f64 },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tasa starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve => server::serve(&config).await,
        AppCommand::Show => {
            let locale: Locale = config.presenter.locale.parse()?;
            let client = providers::util::http_client().context("Failed to build HTTP client")?;
            cli::show::run(
                &config.presenter.endpoint,
                client,
                locale,
                &config.local_currency,
            )
            .await
        }
        AppCommand::Convert { amount_eur } => {
            let locale: Locale = config.presenter.locale.parse()?;
            let client = providers::util::http_client().context("Failed to build HTTP client")?;
            cli::convert::run(&config.presenter.endpoint, client, locale, amount_eur).await
        }
    }
}
