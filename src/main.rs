mod auth;
mod cache;
mod cli;
mod config;
mod error;
mod language;
mod providers;
mod rate_limit;
mod report;
mod retry;
mod summary;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting SentryLens - Sentry issue report tool");
    if let Err(e) = cli.execute().await {
        error!("Report generation failed: {e:#}");
        return Err(e);
    }

    Ok(())
}
