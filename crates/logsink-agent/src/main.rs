// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use logsink::{CollectorConfig, LogSink};

/// Log collector daemon: receives UDP log payloads and stores them in a
/// size-bounded SQLite database.
#[derive(Debug, Parser)]
#[command(name = "logsink-agent", version)]
struct Cli {
    /// Host to bind the UDP endpoint to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = logsink::config::DEFAULT_PORT)]
    port: u16,

    /// SQLite database path.
    #[arg(long, default_value = "logs.db")]
    db_path: PathBuf,

    /// Suppress info-level log messages.
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.quiet);

    let config = CollectorConfig {
        host: cli.host,
        port: cli.port,
        db_path: cli.db_path,
    };

    let (mut handle, _addr) = match LogSink::new(config).start().await {
        Ok(started) => started,
        Err(e) => {
            error!("failed to start log collector: {}", e);
            return ExitCode::FAILURE;
        }
    };

    wait_for_shutdown_signal().await;
    warn!("shutdown signal received, stopping collector...");

    handle.stop();
    handle.stopped().await;
    info!("collector stopped");

    ExitCode::SUCCESS
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_level(true)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging subsystem already initialized");
    }
}

/// Resolves on SIGINT or SIGTERM.
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!("failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
