//! Climux server - TCP front end for a shared line-oriented command
//! interpreter, mirrored onto the local serial console.

use anyhow::Result;
use clap::Parser;
use climux_core::ConnRegistry;
use climux_server::{config, listener, logging, serial, shell, state};
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use listener::CliServer;
use logging::{LogConfig, LogFormat};
use serial::StdoutSerial;
use shell::ShellInterpreter;
use state::ServerState;

/// Climux - multiplex a shared command interpreter over TCP and serial.
#[derive(Parser, Debug)]
#[command(name = "climux-server")]
#[command(about = "TCP front end for a shared command interpreter")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "conn=debug").
    /// Can be specified multiple times; targets are prefixed with
    /// "climux::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    if !config.enabled {
        tracing::info!(target: "climux::startup", "server disabled by configuration, exiting");
        return Ok(());
    }

    tracing::info!(
        target: "climux::startup",
        port = config.port,
        max = config.max_connections,
        "loaded configuration"
    );

    let registry = Arc::new(ConnRegistry::new(config.max_connections));
    let interpreter = ShellInterpreter::new(registry.clone());
    let state = ServerState::new(
        config,
        registry,
        Box::new(interpreter),
        Arc::new(StdoutSerial),
    );

    let handle = CliServer::start(state.clone()).await?;

    // The local console shares the interpreter gate with the TCP peers.
    let console = tokio::spawn(serial::run_console(state, handle.subscribe()));

    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "climux::startup", "shutting down");
    handle.shutdown().await;
    console.abort();

    Ok(())
}
