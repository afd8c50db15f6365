//! Engine configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_ROOM_SIZE;

/// Relative location of the config file inside a world directory.
pub const CONFIG_PATH: &str = ".roomtick/config.yaml";

/// Engine configuration, loaded from .roomtick/config.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width and height of every room
    #[serde(default = "default_room_size")]
    pub room_size: i32,

    /// Rooms simulated at the same time
    #[serde(default = "default_max_parallel_rooms")]
    pub max_parallel_rooms: usize,

    /// Structure types that kill any creep ending its move on them
    #[serde(default = "default_fatal_structures")]
    pub fatal_structures: Vec<String>,

    #[serde(default)]
    pub combat: CombatConfig,

    #[serde(default)]
    pub death: DeathConfig,

    /// Send owners a notification when their objects are attacked
    #[serde(default = "default_true")]
    pub notify_attacks: bool,
}

fn default_room_size() -> i32 {
    DEFAULT_ROOM_SIZE
}
fn default_max_parallel_rooms() -> usize {
    4
}
fn default_fatal_structures() -> Vec<String> {
    vec!["spawn".to_string()]
}
fn default_true() -> bool {
    true
}

/// Damage numbers used by the attack step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Damage per active ATTACK part
    pub attack_power: u32,
    /// Damage per active RANGED_ATTACK part
    pub ranged_attack_power: u32,
    /// Mass attack damage per part at range 1, 2 and 3
    pub ranged_mass_attack_power: [u32; 3],
    pub tower_power_attack: u32,
    /// Tower damage is full up to this range...
    pub tower_optimal_range: i32,
    /// ...and falls off linearly to `tower_falloff` of full power here
    pub tower_falloff_range: i32,
    pub tower_falloff: f64,
    pub tower_energy_cost: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_power: 30,
            ranged_attack_power: 10,
            ranged_mass_attack_power: [10, 4, 1],
            tower_power_attack: 600,
            tower_optimal_range: 5,
            tower_falloff_range: 20,
            tower_falloff: 0.75,
            tower_energy_cost: 10,
        }
    }
}

impl CombatConfig {
    pub fn tower_damage(&self, range: i32) -> u32 {
        let power = self.tower_power_attack as f64;
        if range <= self.tower_optimal_range {
            return self.tower_power_attack;
        }
        let range = range.min(self.tower_falloff_range);
        let span = (self.tower_falloff_range - self.tower_optimal_range).max(1) as f64;
        let progress = (range - self.tower_optimal_range) as f64 / span;
        (power - power * self.tower_falloff * progress).round() as u32
    }

    pub fn mass_attack_damage(&self, range: i32) -> u32 {
        match range {
            0 | 1 => self.ranged_mass_attack_power[0],
            2 => self.ranged_mass_attack_power[1],
            3 => self.ranged_mass_attack_power[2],
            _ => 0,
        }
    }
}

/// Tombstone numbers used by the standard death processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    pub creep_life_time: u32,
    /// Share of the body's spawn cost left in the tombstone
    pub corpse_rate: f64,
    /// Tombstone lifetime per body part
    pub tombstone_decay_per_part: u64,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            creep_life_time: 1500,
            corpse_rate: 0.2,
            tombstone_decay_per_part: 5,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            room_size: default_room_size(),
            max_parallel_rooms: default_max_parallel_rooms(),
            fatal_structures: default_fatal_structures(),
            combat: CombatConfig::default(),
            death: DeathConfig::default(),
            notify_attacks: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from a world directory (looks for .roomtick/config.yaml)
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_PATH);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write this configuration to `root`/.roomtick/config.yaml
    pub fn save_to_dir(&self, root: &Path) -> Result<()> {
        let path = root.join(CONFIG_PATH);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn is_fatal_structure(&self, structure_type: &str) -> bool {
        self.fatal_structures.iter().any(|s| s == structure_type)
    }
}
