//! JSON scenario configuration for headless runs.
//!
//! A scenario describes an area, the creatures in it and how long to run it.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::area::visibility::RoomVisibility;
use crate::area::walkmesh::{Room, Walkmesh};
use crate::area::Area;
use crate::combat::CombatConfig;
use crate::error::{CombatError, ConfigError};
use crate::spawning::{templates, CreatureDef};

/// Headless scenario loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub combat: CombatConfig,
    pub creatures: Vec<CreatureDef>,
    /// Area geometry; a flat square floor when absent
    #[serde(default)]
    pub walkmesh: Option<Walkmesh>,
    /// Frames to simulate
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Ticks between frames
    #[serde(default = "default_step_ms")]
    pub step_ms: u32,
    #[serde(default)]
    pub heartbeat_script: Option<String>,
}

fn default_name() -> String {
    "skirmish".to_string()
}

fn default_frames() -> u32 {
    1200
}

fn default_step_ms() -> u32 {
    50
}

impl Default for ScenarioConfig {
    /// Two party members against three hostiles
    fn default() -> Self {
        Self {
            name: default_name(),
            combat: CombatConfig::default(),
            creatures: vec![
                templates::jedi("bastila").at(-4.0, 0.3, 0.0),
                templates::soldier("carth").at(-6.0, 2.3, 0.0),
                templates::dark_jedi("dark_jedi").at(6.0, 0.3, 0.0),
                templates::sith_trooper("sith_trooper").at(9.0, 3.3, 0.0),
                templates::sith_trooper("sith_trooper").at(9.0, -2.7, 0.0),
            ],
            walkmesh: None,
            frames: default_frames(),
            step_ms: default_step_ms(),
            heartbeat_script: None,
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario: ScenarioConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combat
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.creatures.is_empty() {
            return Err(ConfigError::Invalid("scenario has no creatures".to_string()));
        }
        if self.step_ms == 0 {
            return Err(ConfigError::Invalid("step_ms must be non-zero".to_string()));
        }
        if let Some(def) = self.creatures.iter().find(|def| def.health <= 0) {
            return Err(ConfigError::Invalid(format!(
                "creature {} has no health",
                def.tag
            )));
        }
        Ok(())
    }

    /// Build the area and spawn every creature
    pub fn build_area(&self) -> Result<Area, CombatError> {
        let walkmesh = self.walkmesh.clone().unwrap_or_else(|| {
            Walkmesh::new(vec![Room::square_floor("arena", Vec2::ZERO, 30.0, 0.0)])
        });

        let mut area = Area::new(
            &self.name,
            self.combat.clone(),
            walkmesh,
            RoomVisibility::new(),
        )?;
        area.heartbeat_script = self.heartbeat_script.clone();

        for def in &self.creatures {
            area.spawn_creature(def);
        }
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_valid() {
        let scenario = ScenarioConfig::default();
        assert!(scenario.validate().is_ok());

        let area = scenario.build_area().unwrap();
        assert_eq!(area.world.len(), 5);
        assert!(area.party.leader().is_some());
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{
            "creatures": [
                { "tag": "rat", "faction": 1, "position": [1.0, 0.5, 0.0] },
                { "tag": "hero", "faction": 2, "party": true }
            ],
            "combat": { "random_seed": 5 }
        }"#;
        let scenario: ScenarioConfig = serde_json::from_str(json).unwrap();

        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.frames, 1200);
        assert_eq!(scenario.combat.random_seed, Some(5));
        assert_eq!(scenario.combat.attack_duration, 1500);
    }

    #[test]
    fn test_validate_rejects_empty_and_zero_step() {
        let mut scenario = ScenarioConfig::default();
        scenario.step_ms = 0;
        assert!(matches!(scenario.validate(), Err(ConfigError::Invalid(_))));

        scenario.step_ms = 50;
        scenario.creatures.clear();
        assert!(matches!(scenario.validate(), Err(ConfigError::Invalid(_))));
    }
}
