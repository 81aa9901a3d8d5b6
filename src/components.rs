use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CREATURE_RUN_SPEED, CREATURE_WALK_SPEED, DEFAULT_CRITICAL_MULTIPLIER, UNARMED_DIE,
};
use crate::systems::effects::DamageType;

/// Position component - world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

/// Heading around the Z axis in radians (0 faces +Y)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Facing(pub f32);

impl Facing {
    /// Facing that looks from `from` toward `to` on the XY plane
    pub fn towards(from: Vec3, to: Vec3) -> Option<Self> {
        let dir = (to - from).truncate();
        if dir.length_squared() < f32::EPSILON {
            return None;
        }
        Some(Self(-dir.x.atan2(dir.y)))
    }
}

/// Stable object id, unique within an area for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Creature component - marks an entity as a creature and carries its tag
#[derive(Debug, Clone)]
pub struct Creature {
    pub tag: String,
    /// Walk speed in units per second
    pub walk_speed: f32,
    /// Run speed in units per second
    pub run_speed: f32,
}

impl Creature {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            walk_speed: CREATURE_WALK_SPEED,
            run_speed: CREATURE_RUN_SPEED,
        }
    }
}

/// Health component
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

/// Dead marker - added when health reaches zero
#[derive(Debug, Clone, Copy)]
pub struct Dead;

/// Per-creature combat state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    #[default]
    Idle,
    Attack,
    Cooldown,
    Defense,
}

/// Weapon category driving animation selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WieldType {
    #[default]
    None,
    StunBaton,
    SingleSword,
    DoubleBladedSword,
    DualSwords,
    BlasterPistol,
    DualPistols,
    BlasterRifle,
    HandToHand,
    HeavyWeapon,
}

impl WieldType {
    pub fn is_melee(self) -> bool {
        matches!(
            self,
            WieldType::SingleSword | WieldType::DoubleBladedSword | WieldType::DualSwords
        )
    }

    pub fn is_ranged(self) -> bool {
        matches!(
            self,
            WieldType::BlasterPistol
                | WieldType::DualPistols
                | WieldType::BlasterRifle
                | WieldType::HeavyWeapon
        )
    }
}

/// Ammunition fired by a ranged weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ammunition {
    /// Model name handed to the scene when a projectile spawns
    pub model: String,
}

/// A wielded weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub wield: WieldType,
    pub num_dice: u32,
    pub die: u32,
    pub damage_type: DamageType,
    /// Threat range width: threatens a critical on rolls above `20 - critical_threat`
    pub critical_threat: i32,
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: i32,
    #[serde(default)]
    pub ammunition: Option<Ammunition>,
}

fn default_critical_multiplier() -> i32 {
    DEFAULT_CRITICAL_MULTIPLIER
}

impl Weapon {
    pub fn melee(name: &str, wield: WieldType, num_dice: u32, die: u32) -> Self {
        Self {
            name: name.to_string(),
            wield,
            num_dice,
            die,
            damage_type: DamageType::Slashing,
            critical_threat: 1,
            critical_multiplier: DEFAULT_CRITICAL_MULTIPLIER,
            ammunition: None,
        }
    }

    pub fn ranged(name: &str, wield: WieldType, num_dice: u32, die: u32, ammunition: &str) -> Self {
        Self {
            name: name.to_string(),
            wield,
            num_dice,
            die,
            damage_type: DamageType::Piercing,
            critical_threat: 1,
            critical_multiplier: DEFAULT_CRITICAL_MULTIPLIER,
            ammunition: Some(Ammunition {
                model: ammunition.to_string(),
            }),
        }
    }

    /// Bare hands
    pub fn unarmed() -> Self {
        Self {
            name: "Unarmed".to_string(),
            wield: WieldType::None,
            num_dice: 1,
            die: UNARMED_DIE,
            damage_type: DamageType::Bludgeoning,
            critical_threat: 1,
            critical_multiplier: DEFAULT_CRITICAL_MULTIPLIER,
            ammunition: None,
        }
    }
}

/// Equipment component
#[derive(Debug, Clone, Default)]
pub struct Equipment {
    pub right_weapon: Option<Weapon>,
}

impl Equipment {
    pub fn with_weapon(weapon: Weapon) -> Self {
        Self {
            right_weapon: Some(weapon),
        }
    }

    pub fn wield_type(&self) -> WieldType {
        self.right_weapon
            .as_ref()
            .map(|w| w.wield)
            .unwrap_or(WieldType::None)
    }
}

/// Attack and defense modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatStats {
    pub attack_bonus: i32,
    /// Flat defense score; `None` defers to the engine's defense model
    pub defense: Option<i32>,
}

/// Named model attachment points, as offsets from the object origin.
/// Supplied by the scene; any of them may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttachmentPoints {
    /// Weapon muzzle ("bullethook")
    pub muzzle: Option<Vec3>,
    /// Where incoming projectiles aim ("impact")
    pub impact: Option<Vec3>,
}

/// Collision sphere used by obstacle and elevation tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub radius: f32,
}

impl Default for Collision {
    fn default() -> Self {
        Self { radius: 0.5 }
    }
}

/// Walkmesh room the object currently stands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrentRoom(pub usize);

/// Script run on every area heartbeat for this object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatScript(pub String);
