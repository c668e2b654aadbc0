use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use fabric_gateway::cli::{Cli, commands};
use fabric_gateway::config::{AuthConfig, GatewayConfig};
use fabric_gateway::gateway::Gateway;
use log::{debug, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", e.to_string().red());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // .env values must be visible to the config overrides too
    let dotenv_path = dotenvy::dotenv().ok();
    let config = GatewayConfig::load()?;

    // Initialize logger to file (truncate on each run) so stdout carries only command output
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file: {}", config.log_file))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {:?}", path);
    }

    let auth_config = AuthConfig::from_env();
    info!("Starting fabric-gateway with {} auth", auth_config.method);
    if let Err(e) = auth_config.validate() {
        warn!("{}", e);
        eprintln!("{}", format!("Warning: {}", e).yellow());
    }

    let gateway = Gateway::from_config(auth_config, &config)?;
    let outcome = commands::run_command(cli, &gateway).await;

    if let Some(metrics) = gateway.metrics() {
        match serde_json::to_string(&metrics.snapshot()) {
            Ok(snapshot) => debug!("Request metrics: {}", snapshot),
            Err(e) => warn!("Failed to serialize request metrics: {}", e),
        }
    }

    outcome
}
