//! Per-combatant state machine.
//!
//! Idle -> Attack -> Cooldown -> Idle, with Idle/Cooldown -> Defense -> Idle
//! for the target of a duel. Same-frame cascades (a duel target reacting, a
//! defender freed to attack again) go through a work-list instead of
//! recursion.

use std::collections::VecDeque;

use hecs::{Entity, World};

use crate::actions::ActionQueue;
use crate::components::CombatState;
use crate::events::{EventQueue, GameEvent};
use crate::queries;
use crate::systems::effects::DamageEffect;

use super::animation::Pairing;
use super::attack;
use super::{set_state, Combat};

impl Combat {
    /// Evaluate every combatant once, plus any cascades they trigger
    pub(super) fn run_state_machines(&mut self, world: &mut World, events: &mut EventQueue) {
        puffin::profile_function!();

        let mut work: VecDeque<Entity> = self.roster.iter().collect();
        let limit = self.config.max_cascade_steps.max(self.roster.len());
        let mut steps = 0;

        while let Some(combatant) = work.pop_front() {
            if steps >= limit {
                tracing::warn!(
                    "state machine step limit {} reached, {} evaluations deferred",
                    limit,
                    work.len() + 1
                );
                break;
            }
            steps += 1;
            self.step(world, combatant, &mut work, events);
        }
    }

    /// Whether `entity` is the target half of a duel decided this frame
    pub fn is_duel_target(&self, entity: Entity) -> bool {
        self.duels.iter().any(|pairing| pairing.target == entity)
    }

    /// One transition check for one combatant
    fn step(
        &mut self,
        world: &mut World,
        combatant: Entity,
        work: &mut VecDeque<Entity>,
        events: &mut EventQueue,
    ) {
        if !queries::is_alive(world, combatant) {
            return;
        }
        let Ok(state) = world.get::<&CombatState>(combatant).map(|s| *s) else {
            return;
        };

        match state {
            CombatState::Idle => {
                if self.is_duel_target(combatant) {
                    self.enter_defense(world, combatant, events);
                } else if has_attack_in_range(world, combatant) {
                    self.enter_attack(world, combatant, work, events);
                }
            }
            CombatState::Attack => {
                if !self.state_timers.is_busy(combatant) {
                    set_state(world, combatant, CombatState::Cooldown, events);
                    self.state_timers.arm(combatant, self.config.cooldown_duration);
                }
            }
            CombatState::Cooldown => {
                if self.is_duel_target(combatant) {
                    self.enter_defense(world, combatant, events);
                } else if !self.state_timers.is_busy(combatant) {
                    set_state(world, combatant, CombatState::Idle, events);
                }
            }
            CombatState::Defense => {
                if !self.state_timers.is_busy(combatant) {
                    set_state(world, combatant, CombatState::Idle, events);
                    // Re-evaluate right away so a freed defender can attack this frame
                    work.push_front(combatant);
                }
            }
        }
    }

    fn enter_defense(&mut self, world: &mut World, combatant: Entity, events: &mut EventQueue) {
        set_state(world, combatant, CombatState::Defense, events);
        self.state_timers.arm(combatant, self.config.defense_duration);
    }

    fn enter_attack(
        &mut self,
        world: &mut World,
        combatant: Entity,
        work: &mut VecDeque<Entity>,
        events: &mut EventQueue,
    ) {
        let Some(action) = world
            .get::<&ActionQueue>(combatant)
            .ok()
            .and_then(|queue| queue.attack_in_range().cloned())
        else {
            return;
        };
        let target = action.target;

        if !queries::is_alive(world, target) {
            tracing::trace!(
                "{} attack target {:?} is gone",
                queries::describe(world, combatant),
                target
            );
            pop_action(world, combatant);
            return;
        }

        set_state(world, combatant, CombatState::Attack, events);
        self.state_timers.arm(combatant, self.config.attack_duration);

        let duel = matches!(
            world.get::<&CombatState>(target).map(|s| *s),
            Ok(CombatState::Idle | CombatState::Cooldown)
        );

        let Some(result) = attack::resolve(
            world,
            combatant,
            &action,
            duel,
            self.defense.as_ref(),
            &mut self.rng,
        ) else {
            pop_action(world, combatant);
            return;
        };

        tracing::debug!(
            "{} attacks {}: {:?} for {} ({})",
            queries::describe(world, combatant),
            queries::describe(world, target),
            result.outcome,
            result.damage,
            if duel { "duel" } else { "bash" }
        );
        events.push(GameEvent::AttackResolved {
            attacker: combatant,
            target,
            outcome: result.outcome,
            duel,
        });

        let effect = self.effects.schedule(
            target,
            DamageEffect::new(result.damage, result.damage_type, Some(combatant)),
            self.config.effect_delay,
        );

        let pairing = Pairing {
            attacker: combatant,
            target,
            result,
            effect,
        };
        if duel {
            self.duels.push(pairing);
            // The target reacts this frame
            work.push_front(target);
        } else {
            self.bashes.push(pairing);
        }

        pop_action(world, combatant);
    }
}

fn has_attack_in_range(world: &World, combatant: Entity) -> bool {
    world
        .get::<&ActionQueue>(combatant)
        .map(|queue| queue.attack_in_range().is_some())
        .unwrap_or(false)
}

fn pop_action(world: &mut World, combatant: Entity) {
    if let Ok(mut queue) = world.get::<&mut ActionQueue>(combatant) {
        queue.pop_current();
    }
}
