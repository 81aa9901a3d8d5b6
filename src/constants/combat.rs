//! Combat system constants.

/// Radius around a combatant scanned for hostiles (units)
pub const DETECTION_RANGE: f32 = 20.0;
/// Attack state duration (ticks)
pub const ATTACK_STATE_DURATION: u32 = 1500;
/// Defense state duration (ticks)
pub const DEFENSE_STATE_DURATION: u32 = 1500;
/// Cooldown state duration (ticks)
pub const COOLDOWN_STATE_DURATION: u32 = 1500;
/// Delay between entering Attack and the damage landing (ticks)
pub const EFFECT_APPLY_DELAY: u32 = 500;
/// Time without nearby hostiles before a combatant leaves the roster (ticks)
pub const DEACTIVATION_DELAY: u32 = 2500;
/// Upper bound on state machine evaluations in one frame
pub const MAX_CASCADE_STEPS: usize = 256;
/// Projectile flight speed (units per second)
pub const PROJECTILE_SPEED: f32 = 16.0;
/// Melee reach used by AI-queued attacks (units)
pub const MELEE_ATTACK_RANGE: f32 = 2.0;
/// Reach of ranged weapons used by AI-queued attacks (units)
pub const RANGED_ATTACK_RANGE: f32 = 15.0;

/// Defense of a target without its own defense score
pub const BASELINE_DEFENSE: i32 = 10;
/// Sides on the attack die
pub const ATTACK_DIE: i32 = 20;
/// Critical multiplier when the weapon does not specify one
pub const DEFAULT_CRITICAL_MULTIPLIER: i32 = 2;
