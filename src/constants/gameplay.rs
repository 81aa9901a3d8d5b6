//! Creature defaults.

/// Default walk speed (units per second)
pub const CREATURE_WALK_SPEED: f32 = 1.75;
/// Default run speed (units per second)
pub const CREATURE_RUN_SPEED: f32 = 5.4;
/// Default creature health
pub const CREATURE_DEFAULT_HEALTH: i32 = 30;
/// Die rolled for unarmed damage
pub const UNARMED_DIE: u32 = 4;
