#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Rampart scenario headlessly.

mod reporter;
mod scenario;

use std::{fmt, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rampart_core::{Command, Event};
use rampart_world::{self as world, query, Collaborators, WavePhase, World};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reporter::TracingReporter;
use scenario::Scenario;

/// Command-line arguments for the Rampart simulator.
#[derive(Debug, Parser)]
#[command(name = "rampart", about = "Plays a tower defence scenario headlessly.")]
struct Args {
    /// Path to the TOML scenario to play.
    #[arg(long)]
    scenario: PathBuf,
    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Simulated seconds after which the session is stopped.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,
    /// Overrides the seed stored in the scenario.
    #[arg(long)]
    seed: Option<u64>,
    /// Log filter directives, e.g. `info` or `rampart_world=debug`.
    #[arg(long)]
    log: Option<String>,
}

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let scenario = Scenario::load(&args.scenario)?;
    let summary = run(&scenario, &args)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("failed to install tracing subscriber")
}

fn run(scenario: &Scenario, args: &Args) -> Result<Summary> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be greater than zero");
    }
    if !args.max_seconds.is_finite() || args.max_seconds <= 0.0 {
        bail!("--max-seconds must be a positive number");
    }

    let seed = args.seed.unwrap_or(scenario.seed);
    let collaborators = Collaborators {
        progress: Box::new(TracingReporter::default()),
        ..Collaborators::default()
    };
    let mut world = World::with_collaborators(scenario.world_config(seed), collaborators);
    tracing::info!(
        seed,
        waves = query::wave_count(&world),
        structures = scenario.placements.len(),
        "scenario loaded"
    );

    let mut summary = Summary::default();
    let mut events = Vec::new();

    world::apply(&mut world, Command::StartWaves, &mut events);
    for placement in &scenario.placements {
        world::apply(
            &mut world,
            Command::PlaceStructure {
                kind: placement.kind.clone(),
                position: placement.position,
            },
            &mut events,
        );
    }
    summary.record(&mut events);

    let dt = Duration::from_millis(args.tick_ms);
    let limit = Duration::try_from_secs_f64(args.max_seconds)
        .context("--max-seconds is out of range")?;
    while query::wave_phase(&world) != WavePhase::Complete {
        if query::clock(&world) >= limit {
            tracing::warn!(
                limit_seconds = args.max_seconds,
                live = query::run_state(&world).live_count(),
                "time limit reached; stopping waves"
            );
            world::apply(&mut world, Command::StopWaves, &mut events);
            break;
        }
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        summary.record(&mut events);
    }

    summary.phase = query::wave_phase(&world);
    summary.elapsed = query::clock(&world);
    summary.structures_standing = query::structure_view(&world).len();
    Ok(summary)
}

/// Totals gathered from the event stream of a session.
#[derive(Debug)]
struct Summary {
    phase: WavePhase,
    elapsed: Duration,
    waves_cleared: usize,
    spawned: usize,
    spawn_failures: usize,
    killed: usize,
    leaked: usize,
    structures_placed: usize,
    placements_rejected: usize,
    structures_destroyed: usize,
    structures_standing: usize,
    shots_fired: usize,
    hits: usize,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            phase: WavePhase::Idle,
            elapsed: Duration::ZERO,
            waves_cleared: 0,
            spawned: 0,
            spawn_failures: 0,
            killed: 0,
            leaked: 0,
            structures_placed: 0,
            placements_rejected: 0,
            structures_destroyed: 0,
            structures_standing: 0,
            shots_fired: 0,
            hits: 0,
        }
    }
}

impl Summary {
    /// Consumes the buffered events, updating the totals.
    fn record(&mut self, events: &mut Vec<Event>) {
        for event in events.drain(..) {
            match event {
                Event::WaveStarted { wave } => tracing::info!(wave, "wave started"),
                Event::WaveCleared { wave } => {
                    self.waves_cleared += 1;
                    tracing::info!(wave, "wave cleared");
                }
                Event::AllWavesComplete => tracing::info!("all waves complete"),
                Event::UnitSpawned { .. } => self.spawned += 1,
                Event::SpawnFailed { kind, reason } => {
                    self.spawn_failures += 1;
                    tracing::warn!(%kind, ?reason, "spawn failed");
                }
                Event::UnitDied { .. } => self.killed += 1,
                Event::UnitReachedGoal { unit } => {
                    self.leaked += 1;
                    tracing::debug!(unit = unit.get(), "unit reached the goal");
                }
                Event::StructurePlaced { .. } => self.structures_placed += 1,
                Event::StructurePlacementRejected {
                    kind,
                    position,
                    reason,
                } => {
                    self.placements_rejected += 1;
                    tracing::warn!(%kind, ?position, ?reason, "placement rejected");
                }
                Event::StructureDestroyed { structure } => {
                    self.structures_destroyed += 1;
                    tracing::info!(structure = structure.get(), "structure destroyed");
                }
                Event::ProjectileFired { .. } => self.shots_fired += 1,
                Event::ProjectileHit { .. } => self.hits += 1,
                Event::TimeAdvanced { .. }
                | Event::PreparationStarted { .. }
                | Event::PlacementChanged { .. }
                | Event::ProjectileExpired { .. } => {}
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "session {:?} after {:.1}s",
            self.phase,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(f, "waves cleared: {}", self.waves_cleared)?;
        writeln!(
            f,
            "units spawned: {} (killed {}, leaked {}, failed spawns {})",
            self.spawned, self.killed, self.leaked, self.spawn_failures
        )?;
        writeln!(
            f,
            "structures placed: {} (rejected {}, destroyed {}, standing {})",
            self.structures_placed,
            self.placements_rejected,
            self.structures_destroyed,
            self.structures_standing
        )?;
        write!(f, "projectiles: {} fired, {} hit", self.shots_fired, self.hits)
    }
}
