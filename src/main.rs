use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impfwatch::collector::Collector;
use impfwatch::config::Config;
use impfwatch::metrics::ExporterMetrics;
use impfwatch::server::ExporterServer;
use impfwatch::upstream::DoctolibClient;

#[derive(Parser)]
#[command(
    name = "impfwatch",
    version,
    about = "Prometheus exporter for vaccination appointment availability",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the /metrics endpoint (default)
    Serve {
        /// Listen address, overrides the configured one
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Run one collection cycle and print the exposition to stdout
    Scrape,

    /// Validate configuration and print the effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => serve(config, bind).await?,
        Commands::Scrape => scrape(config).await?,
        Commands::CheckConfig => check_config(&config)?,
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "impfwatch=debug,info".to_string()
    } else {
        format!("impfwatch={level},warn")
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&default_filter))
        .context("Invalid log filter")?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    tracing::info!(
        region = %config.upstream.region,
        upstream = %config.upstream.base_url,
        bind = %config.server.bind_address,
        "Starting exporter"
    );

    let server = ExporterServer::new(&config)?;
    server.start_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn scrape(config: Config) -> Result<()> {
    let client = DoctolibClient::new(&config.upstream).context("Failed to create HTTP client")?;
    let metrics = Arc::new(ExporterMetrics::new().context("Failed to build metrics")?);
    let collector = Collector::new(Arc::new(client), &config.collection, Arc::clone(&metrics));

    let snapshot = collector.collect().await;
    print!("{}", metrics.render(&snapshot)?);
    Ok(())
}

fn check_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("Configuration is valid");
    println!();
    print!("{rendered}");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
