//! Gateway pipeline simulation demo.
//!
//! Runs the admission ticker against the demo topology (or a TOML
//! config) and logs a snapshot every tick. With `--seed` the whole run
//! is reproducible; with `--json` the final snapshot is printed as
//! JSON for external tooling.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_sim::config::{load_config, SimConfig};
use gateway_sim::engine::{Engine, RandomGate, UniformRandom};

#[derive(Debug, Parser)]
#[command(name = "gateway-sim", about = "API gateway pipeline simulation")]
struct Args {
    /// Path to a TOML config file. Defaults to the built-in demo
    /// topology.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run the admission ticker, in seconds.
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Seed for gate and picker randomness, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::demo(),
    };
    tracing::info!(
        routes = config.routes.len(),
        backends = config.backends.len(),
        "configuration loaded"
    );

    let tick = config.timing.admission_interval();
    let drain = config.timing.processing_delay() + config.timing.completed_linger();

    let engine = match args.seed {
        Some(seed) => {
            tracing::info!(seed, "reproducible run");
            let gate = Box::new(RandomGate::with_seed(&config.gates, seed));
            let picker = Box::new(UniformRandom::with_seed(seed));
            Engine::new(config, gate, picker)?
        }
        None => Engine::with_defaults(config)?,
    };

    engine.start();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.duration_secs);
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(tick).await;
        let snap = engine.snapshot();
        tracing::info!(
            in_flight = snap.requests.len(),
            total = snap.stats.total,
            success = snap.stats.success,
            cached = snap.stats.cached,
            rate_limited = snap.stats.rate_limited,
            "tick"
        );
        for backend in &snap.backends {
            tracing::debug!(backend = %backend.id, load = backend.load, "backend load");
        }
    }

    engine.stop();

    // Let in-flight requests finish and retire before the final view.
    tokio::time::sleep(drain).await;

    let snap = engine.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    } else {
        tracing::info!(
            total = snap.stats.total,
            success = snap.stats.success,
            cached = snap.stats.cached,
            rate_limited = snap.stats.rate_limited,
            "final stats"
        );
    }

    Ok(())
}
