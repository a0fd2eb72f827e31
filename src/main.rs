use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use qboard::{config::Config, server::run_with_config_until_ctrl_c};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to config file. Without one, settings come from QBOARD_* variables.
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Cli::parse();

    let config = if let Some(path) = args.config {
        debug!("loading config from {:?}", path);
        Config::load(path).await?
    } else {
        debug!("loading config from environment");
        Config::from_env()?
    };

    run_with_config_until_ctrl_c(config).await?;
    Ok(())
}
