//! Cognitive companion runtime: process entry point.
//!
//! Loads configuration, opens the Store, and runs the Consciousness Cycle
//! Driver (C14) alongside the admin HTTP surface (§6) until asked to stop.

mod admin;
mod channels;
mod cycle;

use clap::Parser;
use cc_core::{Config, Storage, SystemClock};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cognitive companion runtime: sense, think, express, learn on a fixed cadence.
#[derive(Parser, Debug)]
#[command(name = "cc-runtime", version, about)]
struct Cli {
    /// Custom data directory (defaults to the platform's project data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML configuration file. Defaults to built-in settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port for the admin HTTP surface (/healthz, /admin/stop, /admin/reload).
    #[arg(long, default_value_t = 8787)]
    admin_port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    info!(version = cc_core::VERSION, "cognitive companion runtime starting");

    let config = match cli.config {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to load config");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let storage = match Storage::new(cli.data_dir) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "failed to open storage");
            std::process::exit(1);
        }
    };

    let handle = Arc::new(cycle::CycleHandle::new());

    let driver = match cycle::CycleDriver::new(storage, Arc::new(SystemClock), config, handle.clone()) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            error!(error = %e, "failed to construct cycle driver");
            std::process::exit(1);
        }
    };

    let admin_handle = handle.clone();
    let admin_port = cli.admin_port;
    let admin_task = tokio::spawn(async move {
        if let Err(e) = admin::serve(admin_handle, admin_port).await {
            error!(error = %e, "admin surface exited");
        }
    });

    let cycle_task = tokio::spawn(driver.run_forever());

    tokio::select! {
        _ = cycle_task => info!("cycle driver stopped"),
        _ = admin_task => info!("admin surface stopped"),
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, requesting stop");
            handle.request_stop();
        }
    }

    info!("cognitive companion runtime shutting down");
}
