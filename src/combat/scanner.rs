//! Activity scanner and AI master.

use hecs::{Entity, World};

use crate::actions::{Action, ActionQueue, AttackAction};
use crate::components::{CombatState, Equipment};
use crate::constants::{MELEE_ATTACK_RANGE, RANGED_ATTACK_RANGE};
use crate::events::{EventQueue, GameEvent};
use crate::party::Party;
use crate::queries;

use super::{set_state, Combat};

/// Reach of the creature's equipped weapon
pub fn attack_range(world: &World, entity: Entity) -> f32 {
    let wield = world
        .get::<&Equipment>(entity)
        .map(|eq| eq.wield_type())
        .unwrap_or_default();
    if wield.is_ranged() {
        RANGED_ATTACK_RANGE
    } else {
        MELEE_ATTACK_RANGE
    }
}

impl Combat {
    /// Hostility test between two creatures by faction
    pub fn is_enemy(&self, world: &World, a: Entity, b: Entity) -> bool {
        match (queries::faction_of(world, a), queries::faction_of(world, b)) {
            (Some(fa), Some(fb)) => self.hostility.is_hostile_ids(fa, fb),
            _ => false,
        }
    }

    /// Register every living hostile within detection range of `subject`.
    /// Returns whether any were found.
    fn scan_hostility(&mut self, world: &World, subject: Entity, events: &mut EventQueue) -> bool {
        puffin::profile_function!();

        let Some(origin) = queries::position_of(world, subject) else {
            return false;
        };
        let range = self.config.detection_range;

        let mut still_active = false;
        for (creature, position) in queries::creatures_in_area(world) {
            if creature == subject || position.distance(origin) > range {
                continue;
            }
            if !self.is_enemy(world, subject, creature) {
                continue;
            }

            still_active = true;

            if self.roster.register(creature) {
                tracing::debug!(
                    "registered combatant {} (faction {:?})",
                    queries::describe(world, creature),
                    queries::faction_of(world, creature).map(|f| f.0)
                );
                events.push(GameEvent::CombatantRegistered { entity: creature });
            }
        }

        still_active
    }

    /// Decide who is in combat this frame.
    ///
    /// Scans around one actor per frame: the roster front while activated,
    /// the party leader otherwise.
    pub(super) fn scan_activity(&mut self, world: &mut World, party: &Party, events: &mut EventQueue) {
        puffin::profile_function!();

        // Creatures destroyed or killed since the last frame leave from the front
        while let Some(front) = self.roster.front() {
            if queries::is_alive(world, front) {
                break;
            }
            tracing::trace!("dropping stale combatant {:?}", front);
            self.roster.pop_front();
            self.state_timers.cancel(front);
            self.deactivation.cancel(front);
            events.push(GameEvent::CombatantDeactivated { entity: front });
        }

        let activated = self.is_activated();
        let actor = if activated {
            self.roster.front()
        } else {
            party.leader().filter(|leader| queries::is_alive(world, *leader))
        };
        let Some(actor) = actor else {
            tracing::trace!("no party leader, skipping activity scan");
            return;
        };

        let still_active = self.scan_hostility(world, actor, events);

        if !activated {
            return;
        }

        if !still_active {
            if self.deactivation.take_expired(actor) {
                set_state(world, actor, CombatState::Idle, events);
                self.roster.pop_front();
                tracing::debug!(
                    "deactivated {}, activated={}",
                    queries::describe(world, actor),
                    self.is_activated()
                );
                events.push(GameEvent::CombatantDeactivated { entity: actor });
            } else if !self.deactivation.is_armed(actor) {
                self.deactivation.arm(actor, self.config.deactivation_delay);
                tracing::debug!("armed deactivation timer for {}", queries::describe(world, actor));
            }
            return;
        }

        if self.deactivation.is_armed(actor) {
            tracing::debug!("cancelled deactivation timer for {}", queries::describe(world, actor));
        }
        self.deactivation.cancel(actor);
        self.roster.rotate();
    }

    /// Nearest living hostile in the roster strictly within `range`.
    ///
    /// The detection scan includes its boundary and this does not, so a
    /// hostile exactly at the detection range is registered but never picked.
    pub fn find_nearest_hostile(&self, world: &World, combatant: Entity, range: f32) -> Option<Entity> {
        let origin = queries::position_of(world, combatant)?;

        let mut closest = None;
        let mut min_dist = range;
        for other in self.roster.iter() {
            if other == combatant || !queries::is_alive(world, other) {
                continue;
            }
            if !self.is_enemy(world, other, combatant) {
                continue;
            }
            let Some(position) = queries::position_of(world, other) else {
                continue;
            };
            let distance = position.distance(origin);
            if distance < min_dist {
                min_dist = distance;
                closest = Some(other);
            }
        }
        closest
    }

    /// Queue an attack on the nearest hostile for every idle non-leader combatant
    pub(super) fn run_ai_master(&mut self, world: &mut World, party: &Party) {
        puffin::profile_function!();

        let leader = party.leader();
        let combatants: Vec<Entity> = self.roster.iter().collect();

        for combatant in combatants {
            if Some(combatant) == leader || !queries::is_alive(world, combatant) {
                continue;
            }
            let busy = world
                .get::<&ActionQueue>(combatant)
                .map(|queue| !queue.is_empty())
                .unwrap_or(true);
            if busy {
                continue;
            }

            let Some(hostile) =
                self.find_nearest_hostile(world, combatant, self.config.detection_range)
            else {
                continue;
            };

            let range = attack_range(world, combatant);
            if let Ok(mut queue) = world.get::<&mut ActionQueue>(combatant) {
                queue.push(Action::Attack(AttackAction::new(hostile, range).pursuing()));
            }
            tracing::debug!(
                "{} queued attack on {}",
                queries::describe(world, combatant),
                queries::describe(world, hostile)
            );
        }
    }
}
