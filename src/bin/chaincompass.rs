use anyhow::{Context, Result};
use chaincompass::config::AppConfig;
use chaincompass::logging::init_logging;
use chaincompass::{Application, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Env-backed flags must see the .env file, so parse again once it is loaded.
    let mut cli = Cli::parse();
    if dotenvy::from_filename(&cli.env_file).is_ok() {
        cli = Cli::parse();
    }

    let _log_guard = init_logging(cli.log_dir.as_deref()).context("initializing logging")?;

    let config = AppConfig::setup(&cli)?;
    let application = Application::init(config)?;
    application.run().await
}
