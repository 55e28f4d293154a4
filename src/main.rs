use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use meraki_app_usage::config::Config;
use meraki_app_usage::dashboard::MerakiClient;
use meraki_app_usage::geo::GeoLocator;
use meraki_app_usage::logging::init_logging;
use meraki_app_usage::server::{serve, AppState};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "meraki-app-usage")]
#[command(about = "Per-application network usage for a Meraki client across an organization")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on (overrides configuration)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides configuration)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _guard = init_logging(&config.logging);

    if let Err(e) = run(config).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let dashboard = MerakiClient::new(&config.dashboard).context("Failed to build dashboard client")?;
    let geo = GeoLocator::new(&config.geo)?;
    let state = AppState::new(
        Arc::new(dashboard),
        geo,
        config.dashboard.org_name.clone(),
        Duration::from_secs(config.server.session_ttl_secs),
    );

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    println!(
        "{} {} for organization {}",
        "Serving on".bright_cyan(),
        format!("http://{}", address).bright_white().bold(),
        config.dashboard.org_name.bright_yellow()
    );
    info!(address = %address, org = %config.dashboard.org_name, "Server started");

    serve(listener, state).await.context("Server error")
}
