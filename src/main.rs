//! jackwire - auto-wires the JACK/PipeWire port graph
//!
//! Watches for sound-device hotplug events and keeps MIDI controllers wired
//! to a virtual instrument's MIDI inputs, and the instrument's stereo outputs
//! wired to the physical playback ports.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod connections;
mod daemon;
mod graph;
mod hotplug;
mod jack;
mod reconcile;
mod select;

use crate::config::{Settings, DEFAULT_EXCLUDE, DEFAULT_MATCH};
use crate::daemon::Daemon;
use crate::hotplug::DeviceWatcher;
use crate::jack::JackCli;
use crate::reconcile::{ReconcileState, Reconciler};

/// Auto-wires hot-plugged MIDI controllers and instrument audio into the JACK/PipeWire graph
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instrument name match text for MIDI input discovery
    #[arg(long = "match", env = "JACKWIRE_MATCH", default_value = DEFAULT_MATCH)]
    match_text: String,

    /// Comma-separated client names never used as MIDI sources
    #[arg(long, env = "JACKWIRE_EXCLUDE_CLIENTS", default_value = DEFAULT_EXCLUDE)]
    exclude_clients: String,

    /// Minimum reconciliation cadence in seconds
    #[arg(long, env = "JACKWIRE_INTERVAL_SECS", default_value = "1")]
    interval: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run a single reconciliation cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let settings = Settings::new(&args.match_text, &args.exclude_clients, args.interval);
    info!(
        "starting jackwire (match: {:?}, excluded clients: {})",
        settings.instrument_match, args.exclude_clients
    );

    let reconciler = Reconciler::new(Arc::new(JackCli), settings.clone());

    if args.once {
        reconciler.run_cycle(ReconcileState::default()).await;
        return Ok(());
    }

    let watcher = DeviceWatcher::new()?;
    let daemon = Daemon::new(reconciler, watcher, &settings);
    daemon.run(shutdown_signal()).await;

    info!("jackwire shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
