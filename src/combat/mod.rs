//! Real-time combat engine.
//!
//! Driven once per frame by [`Combat::update`]:
//! 1. timers: state timers, deactivation timers and delayed effects
//! 2. activity scanner: who is in combat
//! 3. AI master and the per-combatant state machines (only while activated)
//! 4. animation sync: duel/bash pairings and projectiles
//!
//! The engine never owns creatures. It holds `Entity` handles and re-checks
//! liveness before every use.

pub mod attack;
pub mod config;
pub mod roster;
pub mod timers;

mod animation;
mod scanner;
mod state_machine;

use std::sync::Arc;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::CombatState;
use crate::constants::ticks_to_seconds;
use crate::error::CombatError;
use crate::events::{EventQueue, GameEvent};
use crate::faction::HostilityMatrix;
use crate::party::Party;
use crate::queries;
use crate::systems::effects::{apply_effect, DamageEffect};

pub use animation::{Pairing, Projectile};
pub use attack::{AttackResult, AttackResultType, BaselineDefense, CombatAnimation, DefenseModel};
pub use config::CombatConfig;
pub use roster::Roster;

use timers::{DeactivationTimers, DelayedEffects, StateTimers};

/// Combat engine for one area
#[derive(Debug)]
pub struct Combat {
    config: CombatConfig,
    hostility: Arc<HostilityMatrix>,
    defense: Box<dyn DefenseModel>,
    rng: StdRng,

    roster: Roster,
    state_timers: StateTimers,
    deactivation: DeactivationTimers,
    effects: DelayedEffects,

    /// Pairings decided this frame, drained by the animation sync
    duels: Vec<Pairing>,
    bashes: Vec<Pairing>,

    last_update: Option<u32>,
    effects_applied: u64,
    effects_dropped: u64,
}

impl Combat {
    /// Build an engine. Fails only on a configuration the engine cannot run with.
    pub fn new(config: CombatConfig, hostility: Arc<HostilityMatrix>) -> Result<Self, CombatError> {
        config.validate()?;

        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            hostility,
            defense: Box::new(BaselineDefense::default()),
            rng,
            roster: Roster::new(),
            state_timers: StateTimers::default(),
            deactivation: DeactivationTimers::default(),
            effects: DelayedEffects::default(),
            duels: Vec::new(),
            bashes: Vec::new(),
            last_update: None,
            effects_applied: 0,
            effects_dropped: 0,
        })
    }

    /// Replace the defense score computation
    pub fn with_defense_model(mut self, defense: Box<dyn DefenseModel>) -> Self {
        self.defense = defense;
        self
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn hostility(&self) -> &HostilityMatrix {
        &self.hostility
    }

    /// Run one frame of combat at tick `now`
    pub fn update(&mut self, world: &mut World, party: &Party, now: u32, events: &mut EventQueue) {
        puffin::profile_function!();

        let dt = self
            .last_update
            .map(|last| ticks_to_seconds(now.saturating_sub(last)))
            .unwrap_or(0.0);
        self.last_update = Some(now);

        self.update_timers(world, now, events);
        self.scan_activity(world, party, events);

        if self.is_activated() {
            self.run_ai_master(world, party);
            self.run_state_machines(world, events);
        }

        self.sync_animations(world, dt, events);
    }

    fn update_timers(&mut self, world: &mut World, now: u32, events: &mut EventQueue) {
        puffin::profile_function!();

        self.state_timers.update(now);
        self.deactivation.update(now);

        for pending in self.effects.update(now) {
            if let Some(projectile) = pending.projectile {
                self.reset_projectile(world, projectile, events);
            }

            if apply_effect(world, pending.target, &pending.effect, events) {
                self.effects_applied += 1;
            } else {
                tracing::trace!("dropping delayed effect on stale target {:?}", pending.target);
                self.effects_dropped += 1;
            }
        }
    }

    // =========================================================================
    // ROSTER
    // =========================================================================

    /// Add a creature to the active roster. Returns `false` if already active.
    pub fn register_combatant(&mut self, entity: Entity) -> bool {
        self.roster.register(entity)
    }

    pub fn is_registered(&self, entity: Entity) -> bool {
        self.roster.contains(entity)
    }

    /// Active combatants, next scanned first
    pub fn roster(&self) -> impl Iterator<Item = Entity> + '_ {
        self.roster.iter()
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    /// Membership set and roster order agree
    pub fn roster_is_consistent(&self) -> bool {
        self.roster.is_consistent()
    }

    /// Combat is activated while anyone is in the roster
    pub fn is_activated(&self) -> bool {
        !self.roster.is_empty()
    }

    /// Drop everything the engine knows about `entity` (creature destroyed)
    pub fn forget(&mut self, entity: Entity) {
        self.roster.remove(entity);
        self.state_timers.cancel(entity);
        self.deactivation.cancel(entity);
        self.duels.retain(|p| p.attacker != entity && p.target != entity);
        self.bashes.retain(|p| p.attacker != entity && p.target != entity);
    }

    /// Forget all combat state (area unload)
    pub fn clear(&mut self) {
        self.roster.clear();
        self.state_timers.clear();
        self.deactivation.clear();
        self.effects.clear();
        self.duels.clear();
        self.bashes.clear();
        self.last_update = None;
    }

    // =========================================================================
    // TIMERS AND EFFECTS
    // =========================================================================

    /// Outstanding state timers for `entity`
    pub fn pending_state_timers(&self, entity: Entity) -> u32 {
        self.state_timers.pending(entity)
    }

    /// Schedule `effect` on `target` after the configured effect delay
    pub fn schedule_effect(&mut self, target: Entity, effect: DamageEffect) -> Entity {
        self.effects.schedule(target, effect, self.config.effect_delay)
    }

    pub fn pending_effects(&self) -> usize {
        self.effects.len()
    }

    /// Delayed effects that landed on a live target
    pub fn effects_applied(&self) -> u64 {
        self.effects_applied
    }

    /// Delayed effects discarded because their target was gone
    pub fn effects_dropped(&self) -> u64 {
        self.effects_dropped
    }
}

/// Change a creature's combat state, announcing real changes
fn set_state(world: &mut World, entity: Entity, state: CombatState, events: &mut EventQueue) {
    let Ok(mut current) = world.get::<&mut CombatState>(entity) else {
        return;
    };
    if *current == state {
        return;
    }
    *current = state;
    drop(current);

    tracing::debug!("{} -> {:?}", queries::describe(world, entity), state);
    events.push(GameEvent::CombatStateChanged { entity, state });
}
