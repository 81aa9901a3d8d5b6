//! Combat tuning, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ATTACK_STATE_DURATION, COOLDOWN_STATE_DURATION, DEACTIVATION_DELAY, DEFENSE_STATE_DURATION,
    DETECTION_RANGE, EFFECT_APPLY_DELAY, MAX_CASCADE_STEPS, PROJECTILE_SPEED,
};
use crate::error::{CombatError, ConfigError};

/// Durations are in ticks, distances in world units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Radius around the scanned actor in which hostiles keep combat alive
    pub detection_range: f32,
    pub attack_duration: u32,
    pub defense_duration: u32,
    pub cooldown_duration: u32,
    /// Delay between attack start and damage landing
    pub effect_delay: u32,
    /// How long an actor with no hostiles nearby stays in the roster
    pub deactivation_delay: u32,
    /// Units per second
    pub projectile_speed: f32,
    /// Work-list steps allowed per state machine pass
    pub max_cascade_steps: usize,
    /// Seed for attack rolls; entropy when absent
    pub random_seed: Option<u64>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_range: DETECTION_RANGE,
            attack_duration: ATTACK_STATE_DURATION,
            defense_duration: DEFENSE_STATE_DURATION,
            cooldown_duration: COOLDOWN_STATE_DURATION,
            effect_delay: EFFECT_APPLY_DELAY,
            deactivation_delay: DEACTIVATION_DELAY,
            projectile_speed: PROJECTILE_SPEED,
            max_cascade_steps: MAX_CASCADE_STEPS,
            random_seed: None,
        }
    }
}

impl CombatConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: CombatConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), CombatError> {
        if self.detection_range.is_nan() || self.detection_range <= 0.0 {
            return Err(CombatError::InvalidDetectionRange(self.detection_range));
        }

        for (name, value) in [
            ("attack", self.attack_duration),
            ("defense", self.defense_duration),
            ("cooldown", self.cooldown_duration),
        ] {
            if value == 0 {
                return Err(CombatError::ZeroDuration { name });
            }
        }

        if self.projectile_speed.is_nan() || self.projectile_speed <= 0.0 {
            return Err(CombatError::InvalidProjectileSpeed(self.projectile_speed));
        }

        if self.max_cascade_steps == 0 {
            return Err(CombatError::ZeroCascadeLimit);
        }

        Ok(())
    }
}
