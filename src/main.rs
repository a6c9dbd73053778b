//! Cheese cave agent: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedCave        PinActuator        JsonConfigFile        │
//! │  (SensorPort)         (ActuatorPort)     (ConfigPort)          │
//! │  stdin reader ─▶ Link channels ─▶ stdout writer                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  FanController · CommandHandler · TelemetryLoop        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

mod args;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use log::info;
use tracing_subscriber::prelude::*;

use args::Args;
use cheesecave::adapters::config_file::JsonConfigFile;
use cheesecave::adapters::hardware::{PinActuator, SimulatedCave};
use cheesecave::app::commands::CommandHandler;
use cheesecave::app::fan::FanController;
use cheesecave::app::ports::ConfigPort;
use cheesecave::app::telemetry::TelemetryLoop;
use cheesecave::rpc::channels::Link;
use cheesecave::rpc::engine::RpcEngine;
use cheesecave::rpc::io_task::{run_io_loop, spawn_reader};

/// Shared between the reader thread and the control executor.
static LINK: Link = Link::new();

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let args = Args::parse();
    setup_logging()?;

    // ── 1. Configuration ──────────────────────────────────────
    let mut config = JsonConfigFile::new(args.config.clone())
        .load()
        .context("failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate().context("invalid configuration")?;
    let connection = config.connection().context("invalid connection string")?;

    info!("Cheese cave agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Connecting as {}", connection);
    info!(
        "Desired conditions: {:.1}F ±{:.1}, {:.1}% ±{:.1}",
        config.desired_temperature_f,
        config.desired_temperature_limit_f,
        config.desired_humidity_pct,
        config.desired_humidity_limit_pct
    );

    // ── 2. Adapters ───────────────────────────────────────────
    let cave = SimulatedCave::default();
    let actuator = PinActuator::new(cave.fan_pin(), config.fan_gpio);
    info!("Fan on GPIO{}", actuator.gpio());

    // ── 3. Fan + command handling ─────────────────────────────
    let fan = Arc::new(FanController::new(actuator));
    fan.sync_output().context("failed to initialise fan output")?;
    let engine = RpcEngine::new(CommandHandler::new(Arc::clone(&fan)));

    // ── 4. Link ───────────────────────────────────────────────
    // The reader is detached: when output closes first it may still be
    // blocked on stdin, and process exit reclaims it.
    spawn_reader(std::io::stdin(), &LINK).context("failed to spawn stdin reader")?;

    // ── 5. Run until input closes ─────────────────────────────
    let interval = Duration::from_millis(u64::from(config.telemetry_interval_ms));
    let telemetry = TelemetryLoop::new(cave.sensor(), LINK.reporter(), Arc::clone(&fan))
        .with_desired_conditions(config);
    let (telemetry_stats, engine_stats) = run_io_loop(
        &LINK,
        telemetry,
        interval,
        engine,
        std::io::stdout(),
        &connection.device_id,
    );

    info!(
        "Shutdown: {} reports published, {} cycles skipped",
        telemetry_stats.published, telemetry_stats.skipped
    );
    info!(
        "Shutdown: {} commands handled, {} rejected, {} unknown",
        engine_stats.handled, engine_stats.rejected, engine_stats.unknown_method
    );
    info!("Fan left in state '{}'", fan.current());
    Ok(())
}

/// Logs go to stderr; stdout carries the wire protocol.
fn setup_logging() -> Result<()> {
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("cheesecave=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(())
}
