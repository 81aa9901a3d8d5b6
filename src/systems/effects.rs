//! Effect application.
//!
//! This is the creature side of the effect contract: combat constructs an
//! effect value and hands it over, the target interprets it.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::{Dead, Health, Position};
use crate::events::{EventQueue, GameEvent};

/// Damage categories, with the bit values used by the game data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum DamageType {
    #[default]
    Bludgeoning = 1,
    Piercing = 2,
    Slashing = 4,
    Universal = 8,
    Acid = 16,
    Cold = 32,
    LightSide = 64,
    Electrical = 128,
    Fire = 256,
    DarkSide = 512,
    Sonic = 1024,
    Ion = 2048,
    Blaster = 4096,
}

impl DamageType {
    #[inline]
    pub fn bits(self) -> u16 {
        self as u16
    }
}

/// A damage effect waiting to be applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEffect {
    pub amount: i32,
    pub damage_type: DamageType,
    /// The damager, if still relevant
    pub source: Option<Entity>,
}

impl DamageEffect {
    pub fn new(amount: i32, damage_type: DamageType, source: Option<Entity>) -> Self {
        Self {
            amount,
            damage_type,
            source,
        }
    }
}

/// Apply an effect to its target.
///
/// Returns `false` without touching anything when the target no longer exists,
/// has no health, or is already dead.
pub fn apply_effect(
    world: &mut World,
    target: Entity,
    effect: &DamageEffect,
    events: &mut EventQueue,
) -> bool {
    if world.get::<&Dead>(target).is_ok() {
        return false;
    }

    let died = {
        let Ok(mut health) = world.get::<&mut Health>(target) else {
            return false;
        };
        if health.is_dead() {
            return false;
        }
        health.current = (health.current - effect.amount.max(0)).max(0);
        health.is_dead()
    };

    events.push(GameEvent::DamageApplied {
        target,
        source: effect.source,
        amount: effect.amount.max(0),
        damage_type: effect.damage_type,
    });

    if died {
        let position = world
            .get::<&Position>(target)
            .map(|p| p.0)
            .unwrap_or_default();
        // Entity existence was checked above, insert cannot fail
        let _ = world.insert_one(target, Dead);
        tracing::debug!("entity {:?} died", target);
        events.push(GameEvent::EntityDied {
            entity: target,
            position,
        });
    }

    true
}
