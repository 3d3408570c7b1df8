#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Lane Defence session.

mod autoplay;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use lane_defence_core::SessionConfig;
use lane_defence_rendering::HeadlessBackend;
use lane_defence_simulation::Simulation;
use lane_defence_world::query::{self, Population};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,lane_defence=info";

/// Headless Lane Defence session runner.
#[derive(Parser, Debug)]
#[command(name = "lane-defence")]
#[command(about = "Run a headless Lane Defence session and print a summary")]
struct Args {
    /// TOML file overriding the default session configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,

    /// Simulated frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Collect pickups and place defenders automatically between frames
    #[arg(long)]
    autoplay: bool,

    /// Log filter directive, overriding RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let config = load_config(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        ticks = args.ticks,
        fps = args.fps,
        autoplay = args.autoplay,
        "starting headless session"
    );
    let mut simulation = Simulation::new(config, seed, HeadlessBackend::new())
        .context("failed to start the session")?;

    let frame = Duration::from_secs(1) / args.fps;
    for _ in 0..args.ticks {
        if args.autoplay {
            autoplay::step(&mut simulation);
        }
        let _ = simulation.tick(frame);
        if !query::is_running(simulation.world()) {
            break;
        }
    }

    println!("{}", Summary::capture(&simulation, seed, frame));
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// End-of-run report printed to stdout.
#[derive(Debug)]
struct Summary {
    seed: u64,
    ticks: u64,
    simulated: Duration,
    running: bool,
    lives: u32,
    currency: u32,
    population: Population,
    live_visuals: usize,
    released_visuals: u64,
    skipped_visuals: u64,
}

impl Summary {
    fn capture(simulation: &Simulation<HeadlessBackend>, seed: u64, frame: Duration) -> Self {
        let world = simulation.world();
        let ticks = simulation.ticks();
        Self {
            seed,
            ticks,
            simulated: frame.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX)),
            running: query::is_running(world),
            lives: query::lives(world),
            currency: query::currency(world),
            population: query::population(world),
            live_visuals: simulation.backend().live_count(),
            released_visuals: simulation.backend().released_count(),
            skipped_visuals: simulation.skipped_visuals(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.running { "running" } else { "game over" };
        writeln!(
            f,
            "seed {}: {} ticks, {:.1} s simulated, {outcome}",
            self.seed,
            self.ticks,
            self.simulated.as_secs_f32()
        )?;
        writeln!(f, "lives {}, currency {}", self.lives, self.currency)?;
        writeln!(
            f,
            "entities: {} attackers, {} defenders, {} projectiles, {} pickups",
            self.population.attackers,
            self.population.defenders,
            self.population.projectiles,
            self.population.pickups
        )?;
        write!(
            f,
            "visuals: {} live, {} released, {} skipped",
            self.live_visuals, self.released_visuals, self.skipped_visuals
        )
    }
}
