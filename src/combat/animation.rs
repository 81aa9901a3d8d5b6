//! Animation and projectile synchronization.
//!
//! Runs after the state machines: drains the duel and bash pairings decided
//! this frame into animation events, fires projectiles for ranged attacks and
//! moves the ones in flight.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{AttachmentPoints, Equipment, Facing, Position};
use crate::events::{EventQueue, GameEvent};
use crate::queries;

use super::attack::{AttackResult, CombatAnimation};
use super::Combat;

/// Attacker/target linkage awaiting animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pairing {
    pub attacker: Entity,
    pub target: Entity,
    pub result: AttackResult,
    /// Handle of the delayed effect this attack scheduled
    pub effect: Entity,
}

/// In-flight projectile component
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub source: Entity,
    pub target: Entity,
    pub model: String,
    /// Unit vector
    pub direction: Vec3,
    /// Distance left until the impact point
    pub remaining: f32,
}

impl Combat {
    pub(super) fn sync_animations(&mut self, world: &mut World, dt: f32, events: &mut EventQueue) {
        puffin::profile_function!();

        for pairing in std::mem::take(&mut self.duels) {
            self.animate_pairing(world, &pairing, true, events);
        }
        for pairing in std::mem::take(&mut self.bashes) {
            self.animate_pairing(world, &pairing, false, events);
        }

        self.update_projectiles(world, dt, events);
    }

    fn animate_pairing(
        &mut self,
        world: &mut World,
        pairing: &Pairing,
        duel: bool,
        events: &mut EventQueue,
    ) {
        let (attacker, target) = (pairing.attacker, pairing.target);
        if !world.contains(attacker) || !world.contains(target) {
            tracing::trace!("skipping animation for a destroyed combatant");
            return;
        }

        let animation = pairing.result.animation;

        face(world, attacker, target, events);
        events.push(GameEvent::PlayAnimation {
            entity: attacker,
            animation: animation.attacker,
            wield: animation.attacker_wield,
            variant: animation.variant,
        });

        if duel {
            face(world, target, attacker, events);
            if animation.target != CombatAnimation::None {
                events.push(GameEvent::PlayAnimation {
                    entity: target,
                    animation: animation.target,
                    wield: animation.attacker_wield,
                    variant: animation.variant,
                });
            }
        }

        if animation.attacker_wield.is_ranged() {
            self.fire_projectile(world, pairing, events);
        }
    }

    fn fire_projectile(&mut self, world: &mut World, pairing: &Pairing, events: &mut EventQueue) {
        let Some(model) = world
            .get::<&Equipment>(pairing.attacker)
            .ok()
            .and_then(|eq| eq.right_weapon.as_ref()?.ammunition.as_ref().map(|a| a.model.clone()))
        else {
            return;
        };
        let (Some(from), Some(to)) = (
            attachment_point(world, pairing.attacker, |points| points.muzzle),
            attachment_point(world, pairing.target, |points| points.impact),
        ) else {
            return;
        };

        let offset = to - from;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let direction = offset / distance;

        let projectile = world.spawn((
            Position(from),
            Projectile {
                source: pairing.attacker,
                target: pairing.target,
                model: model.clone(),
                direction,
                remaining: distance,
            },
        ));
        self.effects.attach_projectile(pairing.effect, projectile);

        tracing::trace!(
            "{} fired {} at {}",
            queries::describe(world, pairing.attacker),
            model,
            queries::describe(world, pairing.target)
        );
        events.push(GameEvent::ProjectileFired {
            projectile,
            source: pairing.attacker,
            target: pairing.target,
            model,
            position: from,
            direction,
        });
    }

    /// Advance projectiles along their direction; detonate on arrival
    fn update_projectiles(&mut self, world: &mut World, dt: f32, events: &mut EventQueue) {
        puffin::profile_function!();

        let travel = self.config.projectile_speed * dt;
        let mut detonated = Vec::new();

        for (entity, (pos, projectile)) in world.query_mut::<(&mut Position, &mut Projectile)>() {
            let step = travel.min(projectile.remaining);
            pos.0 += projectile.direction * step;
            projectile.remaining -= step;

            if projectile.remaining <= f32::EPSILON {
                detonated.push((entity, pos.0));
            } else if step > 0.0 {
                events.push(GameEvent::ProjectileMoved {
                    projectile: entity,
                    position: pos.0,
                    facing: FRAC_PI_2 - projectile.direction.x.atan2(projectile.direction.y),
                });
            }
        }

        for (projectile, position) in detonated {
            events.push(GameEvent::ProjectileDetonated {
                projectile,
                position,
            });
            self.reset_projectile(world, projectile, events);
        }
    }

    /// Remove a projectile from the scene, if it is still there
    pub(super) fn reset_projectile(
        &mut self,
        world: &mut World,
        projectile: Entity,
        events: &mut EventQueue,
    ) {
        if world.get::<&Projectile>(projectile).is_err() {
            return;
        }
        if world.despawn(projectile).is_ok() {
            events.push(GameEvent::ProjectileRemoved { projectile });
        }
    }

    /// Projectiles currently in flight
    pub fn projectiles_in_flight(&self, world: &World) -> usize {
        world.query::<&Projectile>().iter().count()
    }
}

fn face(world: &mut World, entity: Entity, target: Entity, events: &mut EventQueue) {
    let (Some(from), Some(to)) = (
        queries::position_of(world, entity),
        queries::position_of(world, target),
    ) else {
        return;
    };
    if let Some(facing) = Facing::towards(from, to) {
        // Creatures without a facing component get one
        let _ = world.insert_one(entity, facing);
    }
    events.push(GameEvent::FaceTowards { entity, target });
}

/// World position of a named attachment point, falling back to the object origin
fn attachment_point(
    world: &World,
    entity: Entity,
    select: impl Fn(&AttachmentPoints) -> Option<Vec3>,
) -> Option<Vec3> {
    let origin = queries::position_of(world, entity)?;
    let offset = world
        .get::<&AttachmentPoints>(entity)
        .ok()
        .and_then(|points| select(&points))
        .unwrap_or(Vec3::ZERO);
    Some(origin + offset)
}
