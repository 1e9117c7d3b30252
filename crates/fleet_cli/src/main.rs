mod settings;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fleet_core::{FleetEngine, FleetRuntime, FleetSnapshot, LiveReading, PatientId};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-sim",
    about = "Emergency fleet state and vitals simulation",
    long_about = "Dispatches patients to a simulated ambulance fleet and prints one JSON\n\
                  snapshot per interval to stdout. Logs go to stderr."
)]
struct Cli {
    /// JSON file with fleet timings and an optional roster
    #[arg(long, env = "FLEET_CONFIG")]
    config: Option<PathBuf>,
    /// RNG seed, overrides the config file
    #[arg(long, env = "FLEET_SEED")]
    seed: Option<u64>,
    /// Simulated seconds to run
    #[arg(long, env = "FLEET_DURATION_SECS", default_value_t = 60)]
    duration_secs: u64,
    /// Patients dispatched at start, comma separated
    #[arg(long, value_delimiter = ',')]
    dispatch: Vec<String>,
    /// Start a live vitals stream for the first dispatched patient
    #[arg(long)]
    monitor: bool,
    /// Pace against the wall clock instead of fast-forwarding
    #[arg(long, env = "FLEET_REALTIME")]
    realtime: bool,
    /// Seconds between printed snapshots
    #[arg(long, default_value_t = 5)]
    snapshot_secs: u64,
}

#[derive(Serialize)]
struct SnapshotLine<'a> {
    #[serde(flatten)]
    snapshot: &'a FleetSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    live: Option<LiveReading>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.snapshot_secs > 0, "--snapshot-secs must be positive");
    let settings = Settings::resolve(cli.config.as_deref(), cli.seed)?;
    let pickup = settings
        .roster
        .first()
        .map(|seed| seed.location)
        .unwrap_or_default();

    let engine = if cli.realtime {
        FleetEngine::with_wall_clock(settings.fleet, &settings.roster)?
    } else {
        FleetEngine::new(settings.fleet, &settings.roster)?
    };
    let engine = Arc::new(engine);

    for patient in &cli.dispatch {
        match engine.dispatch_patient(patient.as_str(), pickup) {
            Ok(unit) => info!(%patient, unit = %unit.id, "dispatched"),
            Err(err) => warn!(%patient, error = %err, "dispatch refused"),
        }
    }

    let monitored = match (cli.monitor, cli.dispatch.first()) {
        (true, Some(first)) => {
            let patient = PatientId::new(first.as_str());
            engine
                .start_monitoring(&patient)
                .with_context(|| format!("starting live stream for {patient}"))?;
            Some(patient)
        }
        (true, None) => anyhow::bail!("--monitor needs at least one --dispatch patient"),
        (false, _) => None,
    };

    if cli.realtime {
        run_realtime(&engine, &cli, monitored.as_ref()).await?;
    } else {
        run_fast_forward(&engine, &cli, monitored.as_ref())?;
    }

    let journeys = engine.completed_journeys();
    info!(
        completed = journeys.len(),
        events = engine.events_processed(),
        "simulation finished"
    );
    engine.shutdown();
    Ok(())
}

fn run_fast_forward(engine: &FleetEngine, cli: &Cli, monitored: Option<&PatientId>) -> Result<()> {
    let end_ms = cli.duration_secs.saturating_mul(1_000);
    let step_ms = cli.snapshot_secs.saturating_mul(1_000);
    let mut at = 0;
    while at < end_ms {
        at = (at + step_ms).min(end_ms);
        engine.advance_to(at);
        print_snapshot(engine, monitored)?;
    }
    Ok(())
}

async fn run_realtime(
    engine: &Arc<FleetEngine>,
    cli: &Cli,
    monitored: Option<&PatientId>,
) -> Result<()> {
    let runtime = FleetRuntime::spawn(Arc::clone(engine))?;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.duration_secs);
    let mut interval = tokio::time::interval(Duration::from_secs(cli.snapshot_secs));
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => print_snapshot(engine, monitored)?,
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
    runtime.shutdown().await;
    Ok(())
}

fn print_snapshot(engine: &FleetEngine, monitored: Option<&PatientId>) -> Result<()> {
    let snapshot = engine.snapshot();
    let live = monitored
        .and_then(|patient| engine.monitor_readings(patient))
        .and_then(|readings| readings.last().copied());
    let line = serde_json::to_string(&SnapshotLine {
        snapshot: &snapshot,
        live,
    })?;
    let mut out = io::stdout().lock();
    writeln!(out, "{line}")?;
    Ok(())
}
