//! Game event system for decoupled communication between systems.
//!
//! The combat engine and the area emit events; the scene, audio, GUI and
//! script runner consume them. Every event is fire-and-forget.

use glam::Vec3;
use hecs::Entity;

use crate::combat::attack::{AttackResultType, CombatAnimation};
use crate::components::{CombatState, WieldType};
use crate::systems::effects::DamageType;

/// Game events that systems can emit and subscribe to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Turn an object to face another
    FaceTowards { entity: Entity, target: Entity },
    /// Play a combat animation on a creature
    PlayAnimation {
        entity: Entity,
        animation: CombatAnimation,
        wield: WieldType,
        variant: Option<u8>,
    },
    /// An attack was resolved and its pairing animated
    AttackResolved {
        attacker: Entity,
        target: Entity,
        outcome: AttackResultType,
        duel: bool,
    },
    /// A projectile was added to the scene
    ProjectileFired {
        projectile: Entity,
        source: Entity,
        target: Entity,
        model: String,
        position: Vec3,
        direction: Vec3,
    },
    /// A projectile moved this frame
    ProjectileMoved {
        projectile: Entity,
        position: Vec3,
        facing: f32,
    },
    /// A projectile reached its impact point
    ProjectileDetonated { projectile: Entity, position: Vec3 },
    /// A projectile must be removed from the scene
    ProjectileRemoved { projectile: Entity },
    /// Damage landed on a creature
    DamageApplied {
        target: Entity,
        source: Option<Entity>,
        amount: i32,
        damage_type: DamageType,
    },
    /// A creature died
    EntityDied { entity: Entity, position: Vec3 },
    /// A creature's combat state changed
    CombatStateChanged { entity: Entity, state: CombatState },
    /// A creature joined the active roster
    CombatantRegistered { entity: Entity },
    /// A creature left the active roster
    CombatantDeactivated { entity: Entity },
    /// A script should run
    ScriptRequested {
        script: String,
        caller: Option<Entity>,
        triggerer: Option<Entity>,
    },
    /// A trigger linked to another module was entered
    ModuleTransitionRequested { module: String, waypoint: String },
    /// A conversation should start
    ConversationRequested {
        speaker: Entity,
        target: Entity,
        dialog: String,
    },
}

/// Simple event queue - events are pushed during update, processed at end of frame
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to be processed later
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain all events for processing
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Look at pending events without consuming them
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Check if there are pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
