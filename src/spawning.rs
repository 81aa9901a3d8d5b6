//! Data-driven creature spawning.
//!
//! A creature definition carries everything needed to put a combat-ready
//! creature into the world, so scenarios can be described in JSON.

use glam::Vec3;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::actions::ActionQueue;
use crate::components::{
    AttachmentPoints, Collision, CombatState, CombatStats, Creature, Equipment, Facing,
    HeartbeatScript, Health, ObjectId, Position, Weapon,
};
use crate::constants::{CREATURE_DEFAULT_HEALTH, CREATURE_RUN_SPEED, CREATURE_WALK_SPEED};
use crate::faction::FactionId;

/// Definition of a creature - all the data needed to spawn one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureDef {
    pub tag: String,
    /// Raw faction id as found in the game data
    pub faction: i32,
    #[serde(default = "default_position")]
    pub position: [f32; 3],
    #[serde(default = "default_health")]
    pub health: i32,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_run_speed")]
    pub run_speed: f32,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub defense: Option<i32>,
    /// Offset of the weapon muzzle from the creature origin
    #[serde(default)]
    pub muzzle: Option<[f32; 3]>,
    /// Offset incoming projectiles aim at
    #[serde(default)]
    pub impact: Option<[f32; 3]>,
    /// Joins the player party
    #[serde(default)]
    pub party: bool,
    #[serde(default)]
    pub heartbeat_script: Option<String>,
}

fn default_position() -> [f32; 3] {
    [0.0; 3]
}

fn default_health() -> i32 {
    CREATURE_DEFAULT_HEALTH
}

fn default_walk_speed() -> f32 {
    CREATURE_WALK_SPEED
}

fn default_run_speed() -> f32 {
    CREATURE_RUN_SPEED
}

impl CreatureDef {
    pub fn new(tag: &str, faction: impl Into<FactionId>) -> Self {
        Self {
            tag: tag.to_string(),
            faction: faction.into().0,
            position: default_position(),
            health: default_health(),
            weapon: None,
            walk_speed: default_walk_speed(),
            run_speed: default_run_speed(),
            attack_bonus: 0,
            defense: None,
            muzzle: None,
            impact: None,
            party: false,
            heartbeat_script: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    /// Spawn this creature with the given object id
    pub fn spawn(&self, world: &mut World, id: ObjectId) -> Entity {
        let creature = Creature {
            tag: self.tag.clone(),
            walk_speed: self.walk_speed,
            run_speed: self.run_speed,
        };
        let equipment = match &self.weapon {
            Some(weapon) => Equipment::with_weapon(weapon.clone()),
            None => Equipment::default(),
        };

        let entity = world.spawn((
            id,
            creature,
            Position(Vec3::from(self.position)),
            Facing::default(),
            FactionId(self.faction),
            Health::new(self.health),
            CombatState::Idle,
            ActionQueue::new(),
            equipment,
            CombatStats {
                attack_bonus: self.attack_bonus,
                defense: self.defense,
            },
            Collision::default(),
            AttachmentPoints {
                muzzle: self.muzzle.map(Vec3::from),
                impact: self.impact.map(Vec3::from),
            },
        ));

        if let Some(script) = &self.heartbeat_script {
            // Spawned above, cannot fail
            let _ = world.insert_one(entity, HeartbeatScript(script.clone()));
        }

        entity
    }
}

/// Stock creatures used by the simulator and tests
pub mod templates {
    use super::*;
    use crate::components::WieldType;
    use crate::faction::Faction;

    pub fn soldier(tag: &str) -> CreatureDef {
        CreatureDef::new(tag, Faction::Friendly1)
            .with_weapon(Weapon::ranged(
                "Blaster Pistol",
                WieldType::BlasterPistol,
                1,
                6,
                "w_blstrbolt",
            ))
            .with_health(40)
    }

    pub fn jedi(tag: &str) -> CreatureDef {
        let mut def = CreatureDef::new(tag, Faction::Friendly1)
            .with_weapon(Weapon::melee("Lightsaber", WieldType::SingleSword, 2, 8))
            .with_health(60);
        def.attack_bonus = 4;
        def.party = true;
        def
    }

    pub fn sith_trooper(tag: &str) -> CreatureDef {
        CreatureDef::new(tag, Faction::Hostile1)
            .with_weapon(Weapon::ranged(
                "Blaster Rifle",
                WieldType::BlasterRifle,
                1,
                8,
                "w_blstrbolt",
            ))
            .with_health(30)
    }

    pub fn dark_jedi(tag: &str) -> CreatureDef {
        let mut def = CreatureDef::new(tag, Faction::Hostile1)
            .with_weapon(Weapon::melee("Lightsaber", WieldType::SingleSword, 2, 8))
            .with_health(50);
        def.attack_bonus = 2;
        def
    }

    pub fn kinrath(tag: &str) -> CreatureDef {
        CreatureDef::new(tag, Faction::Hostile2)
            .with_weapon(Weapon::unarmed())
            .with_health(20)
    }
}
