//! Attack resolution.
//!
//! Rolls the attack, picks the animations both sides play and computes the
//! damage. Nothing here mutates the attacker or the target; the engine applies
//! the result later through a delayed effect.

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actions::AttackAction;
use crate::components::{CombatStats, Equipment, Weapon, WieldType};
use crate::constants::{ATTACK_DIE, BASELINE_DEFENSE};
use crate::systems::effects::DamageType;

/// Outcome of an attack roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackResultType {
    HitSuccessful,
    CriticalHit,
    AutomaticHit,
    Miss,
}

impl AttackResultType {
    #[inline]
    pub fn is_hit(self) -> bool {
        !matches!(self, AttackResultType::Miss)
    }
}

/// Combat animations the scene knows how to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatAnimation {
    #[default]
    None,
    Attack,
    Damage,
    Dodge,
    MeleeAttack,
    MeleeDamage,
    MeleeDodge,
    CinematicMeleeAttack,
    CinematicMeleeDamage,
    CinematicMeleeParry,
    BlasterAttack,
}

/// Animations chosen for one attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackAnimation {
    pub attacker: CombatAnimation,
    /// `CombatAnimation::None` for one-sided attacks
    pub target: CombatAnimation,
    pub attacker_wield: WieldType,
    pub variant: Option<u8>,
}

/// Fully resolved attack, ready to animate and apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackResult {
    pub outcome: AttackResultType,
    pub animation: AttackAnimation,
    /// Zero on a miss
    pub damage: i32,
    pub damage_type: DamageType,
}

// =============================================================================
// DEFENSE
// =============================================================================

/// Computes the score an attack roll has to reach
pub trait DefenseModel: std::fmt::Debug {
    fn defense(&self, world: &World, target: Entity) -> i32;
}

/// Flat defense score. A target's own `CombatStats::defense` takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineDefense(pub i32);

impl Default for BaselineDefense {
    fn default() -> Self {
        Self(BASELINE_DEFENSE)
    }
}

impl DefenseModel for BaselineDefense {
    fn defense(&self, world: &World, target: Entity) -> i32 {
        world
            .get::<&CombatStats>(target)
            .ok()
            .and_then(|stats| stats.defense)
            .unwrap_or(self.0)
    }
}

// =============================================================================
// PURE RESOLUTION
// =============================================================================

/// Decide the outcome of a d20 roll.
///
/// A natural 20 always lands as `AutomaticHit`. Other hits whose natural roll
/// falls in the weapon's threat range are confirmed with `confirm_roll` and
/// upgraded to `CriticalHit`.
pub fn determine_outcome(
    roll: i32,
    attack_bonus: i32,
    defense: i32,
    critical_threat: i32,
    confirm_roll: impl FnOnce() -> i32,
) -> AttackResultType {
    if roll >= ATTACK_DIE {
        return AttackResultType::AutomaticHit;
    }
    if roll + attack_bonus < defense {
        return AttackResultType::Miss;
    }
    if roll > ATTACK_DIE - critical_threat && confirm_roll() + attack_bonus >= defense {
        return AttackResultType::CriticalHit;
    }
    AttackResultType::HitSuccessful
}

/// Pick the animations for an attack.
///
/// Duels animate both sides; one-sided attacks only animate the attacker.
pub fn determine_animation(
    duel: bool,
    attacker_wield: WieldType,
    target_wield: WieldType,
    outcome: AttackResultType,
    rng: &mut impl Rng,
) -> AttackAnimation {
    let hit = outcome.is_hit();
    let pick = |hit_anim, miss_anim| if hit { hit_anim } else { miss_anim };

    let (attacker, target, variant) = if duel {
        if attacker_wield.is_melee() && target_wield.is_melee() {
            (
                CombatAnimation::CinematicMeleeAttack,
                pick(
                    CombatAnimation::CinematicMeleeDamage,
                    CombatAnimation::CinematicMeleeParry,
                ),
                Some(rng.gen_range(1..=5)),
            )
        } else if attacker_wield.is_melee() {
            (
                CombatAnimation::MeleeAttack,
                pick(CombatAnimation::MeleeDamage, CombatAnimation::MeleeDodge),
                Some(rng.gen_range(1..=2)),
            )
        } else if attacker_wield.is_ranged() {
            (
                CombatAnimation::BlasterAttack,
                pick(CombatAnimation::Damage, CombatAnimation::Dodge),
                None,
            )
        } else {
            (
                CombatAnimation::Attack,
                pick(CombatAnimation::Damage, CombatAnimation::Dodge),
                Some(rng.gen_range(1..=2)),
            )
        }
    } else if attacker_wield.is_ranged() {
        (CombatAnimation::BlasterAttack, CombatAnimation::None, None)
    } else {
        (
            CombatAnimation::Attack,
            CombatAnimation::None,
            Some(rng.gen_range(1..=2)),
        )
    };

    AttackAnimation {
        attacker,
        target,
        attacker_wield,
        variant,
    }
}

/// Roll weapon damage: `num_dice` x d`die`, at least 1, times `multiplier`
pub fn roll_damage(weapon: &Weapon, multiplier: i32, rng: &mut impl Rng) -> i32 {
    let die = weapon.die.max(1);
    let amount: u32 = (0..weapon.num_dice).map(|_| rng.gen_range(1..=die)).sum();
    (amount.max(1) as i32).saturating_mul(multiplier.max(1))
}

// =============================================================================
// WORLD-FACING RESOLUTION
// =============================================================================

/// Resolve `attack` from `attacker`. Returns `None` if either side is gone.
pub fn resolve(
    world: &World,
    attacker: Entity,
    attack: &AttackAction,
    duel: bool,
    defense_model: &dyn DefenseModel,
    rng: &mut impl Rng,
) -> Option<AttackResult> {
    if !world.contains(attacker) || !world.contains(attack.target) {
        return None;
    }

    let weapon = world
        .get::<&Equipment>(attacker)
        .ok()
        .and_then(|eq| eq.right_weapon.clone())
        .unwrap_or_else(Weapon::unarmed);
    let attack_bonus = world
        .get::<&CombatStats>(attacker)
        .map(|stats| stats.attack_bonus)
        .unwrap_or(0);
    let target_wield = world
        .get::<&Equipment>(attack.target)
        .map(|eq| eq.wield_type())
        .unwrap_or_default();

    let outcome = match attack.forced_outcome {
        Some(outcome) => outcome,
        None => {
            let defense = defense_model.defense(world, attack.target);
            let roll = rng.gen_range(1..=ATTACK_DIE);
            determine_outcome(roll, attack_bonus, defense, weapon.critical_threat, || {
                rng.gen_range(1..=ATTACK_DIE)
            })
        }
    };

    let animation = determine_animation(duel, weapon.wield, target_wield, outcome, rng);

    let multiplier = match outcome {
        AttackResultType::CriticalHit => weapon.critical_multiplier.max(1),
        _ => 1,
    };
    let (damage, damage_type) = match (outcome.is_hit(), attack.forced_damage) {
        (false, _) => (0, weapon.damage_type),
        (true, Some(forced)) => (forced.max(0).saturating_mul(multiplier), DamageType::Universal),
        (true, None) => (roll_damage(&weapon, multiplier, rng), weapon.damage_type),
    };

    Some(AttackResult {
        outcome,
        animation,
        damage,
        damage_type,
    })
}
