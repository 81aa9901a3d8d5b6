//! Headless combat simulator.
//!
//! Loads a scenario (or uses the built-in skirmish), runs the area for a fixed
//! number of frames and logs what happened.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpg_runtime::area::Area;
use rpg_runtime::components::{CombatState, Dead, Health};
use rpg_runtime::events::GameEvent;
use rpg_runtime::queries;
use rpg_runtime::scenario::ScenarioConfig;

#[derive(Debug, Parser)]
#[command(name = "combat-sim", about = "Run a headless combat scenario")]
struct Args {
    /// Scenario JSON file; the built-in skirmish when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the number of frames to run
    #[arg(long)]
    frames: Option<u32>,

    /// Override the ticks between frames
    #[arg(long)]
    step_ms: Option<u32>,

    /// Seed for attack rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Serve profiling data to puffin_viewer
    #[arg(long)]
    profile: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let _puffin_server = if args.profile {
        let addr = format!("0.0.0.0:{}", puffin_http::DEFAULT_PORT);
        let server = puffin_http::Server::new(&addr)?;
        puffin::set_scopes_on(true);
        tracing::info!("puffin server listening on {}", addr);
        Some(server)
    } else {
        None
    };

    let mut scenario = match &args.scenario {
        Some(path) => ScenarioConfig::load_from_file(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(frames) = args.frames {
        scenario.frames = frames;
    }
    if let Some(step_ms) = args.step_ms {
        scenario.step_ms = step_ms;
    }
    if args.seed.is_some() {
        scenario.combat.random_seed = args.seed;
    }
    scenario.validate()?;

    let mut area = scenario.build_area()?;
    tracing::info!(
        "running {} with {} creatures for {} frames",
        scenario.name,
        scenario.creatures.len(),
        scenario.frames
    );

    let mut stats = RunStats::default();
    for frame in 0..scenario.frames {
        puffin::GlobalProfiler::lock().new_frame();

        let now = frame.saturating_mul(scenario.step_ms);
        area.update(now);

        let events: Vec<GameEvent> = area.events.drain().collect();
        stats.record(&area, &events, now);
    }

    summarize(&area, &stats);
    Ok(())
}

#[derive(Debug, Default)]
struct RunStats {
    attacks: usize,
    hits: usize,
    damage: i64,
    deaths: usize,
    projectiles: usize,
    peak_roster: usize,
    scripts: HashMap<String, usize>,
}

impl RunStats {
    fn record(&mut self, area: &Area, events: &[GameEvent], now: u32) {
        for event in events {
            match event {
                GameEvent::AttackResolved {
                    attacker,
                    target,
                    outcome,
                    duel,
                } => {
                    self.attacks += 1;
                    if outcome.is_hit() {
                        self.hits += 1;
                    }
                    tracing::debug!(
                        "[{}] {} attacks {}: {:?}{}",
                        now,
                        queries::describe(&area.world, *attacker),
                        queries::describe(&area.world, *target),
                        outcome,
                        if *duel { " (duel)" } else { "" }
                    );
                }
                GameEvent::DamageApplied { amount, .. } => self.damage += i64::from(*amount),
                GameEvent::EntityDied { entity, .. } => {
                    self.deaths += 1;
                    tracing::info!("[{}] {} died", now, queries::describe(&area.world, *entity));
                }
                GameEvent::ProjectileFired { .. } => self.projectiles += 1,
                GameEvent::ScriptRequested { script, .. } => {
                    *self.scripts.entry(script.clone()).or_default() += 1;
                }
                _ => {}
            }
        }
        self.peak_roster = self.peak_roster.max(area.combat.roster_len());
    }
}

fn summarize(area: &Area, stats: &RunStats) {
    tracing::info!(
        "{} attacks, {} hits, {} damage, {} deaths, {} projectiles, peak roster {}",
        stats.attacks,
        stats.hits,
        stats.damage,
        stats.deaths,
        stats.projectiles,
        stats.peak_roster
    );
    tracing::info!(
        "effects applied {}, dropped {}",
        area.combat.effects_applied(),
        area.combat.effects_dropped()
    );
    for (script, count) in &stats.scripts {
        tracing::info!("script {} requested {} times", script, count);
    }

    let mut survivors: Vec<_> = area
        .world
        .query::<(&Health, &CombatState)>()
        .without::<&Dead>()
        .iter()
        .map(|(entity, (health, state))| {
            (queries::describe(&area.world, entity), health.current, *state)
        })
        .collect();
    survivors.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, health, state) in survivors {
        tracing::info!("{}: {} hp, {:?}", name, health, state);
    }
}
