//! PrivGate Daemon - policy decisions for sensitive-data access
//!
//! The daemon provides:
//! - REST API for access requests and user decisions
//! - Profile installation and switching
//! - A pending-prompt queue standing in for the consent UI
//! - Uninstall cascades

use clap::Parser;
use privgate_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PrivGate Daemon CLI
#[derive(Parser)]
#[command(name = "privgated")]
#[command(about = "PrivGate Daemon - policy decisions for sensitive-data access", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PRIVGATE_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "PRIVGATE_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "PRIVGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "PRIVGATE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        grant_timeframe_secs = config.engine.ask_grant_timeframe_secs,
        default_profile = %config.engine.default_profile,
        "Starting PrivGate daemon"
    );

    let server = Server::new(config).await?;
    server.run().await
}
