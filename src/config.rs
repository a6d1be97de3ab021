//! TOML-loadable simulation parameters.
//!
//! Mirrors the original Python implementation's flat `modules/config.py`
//! constants, generalized into a struct so every field can be overridden
//! from a config file while still falling back to the same defaults.

use crate::error::FungeraError;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_memory_size() -> (i64, i64) {
    (1000, 1000)
}

fn default_info_display_size() -> (i64, i64) {
    (10, 40)
}

fn default_scroll_step() -> i64 {
    5
}

fn default_random_rate() -> u64 {
    50
}

fn default_cycle_gap() -> u64 {
    100
}

fn default_memory_full_ratio() -> f64 {
    0.75
}

fn default_kill_organisms_ratio() -> f64 {
    0.2
}

fn default_stack_length() -> usize {
    10
}

fn default_organism_death_rate() -> u64 {
    50
}

fn default_kill_if_no_child() -> u64 {
    500
}

fn default_autosave_rate() -> u64 {
    10_000
}

fn default_simulation_name() -> String {
    "fungera".to_string()
}

/// Every knob in the specification's "Configuration" surface. Deserialized
/// from TOML with per-field fallbacks, so a config file only needs to name
/// the settings it wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_memory_size")]
    pub memory_size: (i64, i64),

    #[serde(default = "default_info_display_size")]
    pub info_display_size: (i64, i64),

    #[serde(default = "default_scroll_step")]
    pub scroll_step: i64,

    /// Cosmic-ray mutations applied per `random_rate` cycles (0 disables).
    #[serde(default = "default_random_rate")]
    pub random_rate: u64,

    /// How often (in cycles) the engine checks memory pressure and culls.
    #[serde(default = "default_cycle_gap")]
    pub cycle_gap: u64,

    #[serde(default = "default_memory_full_ratio")]
    pub memory_full_ratio: f64,

    #[serde(default = "default_kill_organisms_ratio")]
    pub kill_organisms_ratio: f64,

    #[serde(default = "default_stack_length")]
    pub stack_length: usize,

    #[serde(default)]
    pub random_seed: Option<u64>,

    #[serde(default = "default_organism_death_rate")]
    pub organism_death_rate: u64,

    #[serde(default = "default_kill_if_no_child")]
    pub kill_if_no_child: u64,

    #[serde(default = "default_autosave_rate")]
    pub autosave_rate: u64,

    #[serde(default = "default_simulation_name")]
    pub simulation_name: String,

    #[serde(default)]
    pub snapshot_to_load: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            memory_size: default_memory_size(),
            info_display_size: default_info_display_size(),
            scroll_step: default_scroll_step(),
            random_rate: default_random_rate(),
            cycle_gap: default_cycle_gap(),
            memory_full_ratio: default_memory_full_ratio(),
            kill_organisms_ratio: default_kill_organisms_ratio(),
            stack_length: default_stack_length(),
            random_seed: None,
            organism_death_rate: default_organism_death_rate(),
            kill_if_no_child: default_kill_if_no_child(),
            autosave_rate: default_autosave_rate(),
            simulation_name: default_simulation_name(),
            snapshot_to_load: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<EngineConfig, FungeraError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn memory_size_vec(&self) -> Vec2 {
        Vec2::new(self.memory_size.0, self.memory_size.1)
    }
}

/// The slice of `EngineConfig` the scheduling queue and its organisms need.
/// Kept separate from `EngineConfig` itself so `Organism`/`Queue` depend
/// only on the knobs that govern them, not the whole configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub organism_death_rate: u64,
    pub kill_if_no_child: u64,
    pub stack_length: usize,
    pub kill_organisms_ratio: f64,
}

impl From<&EngineConfig> for QueueConfig {
    fn from(config: &EngineConfig) -> Self {
        QueueConfig {
            organism_death_rate: config.organism_death_rate,
            kill_if_no_child: config.kill_if_no_child,
            stack_length: config.stack_length,
            kill_organisms_ratio: config.kill_organisms_ratio,
        }
    }
}

impl From<EngineConfig> for QueueConfig {
    fn from(config: EngineConfig) -> Self {
        QueueConfig::from(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let reparsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let partial: EngineConfig = toml::from_str("stack_length = 20\n").unwrap();
        assert_eq!(partial.stack_length, 20);
        assert_eq!(partial.memory_full_ratio, default_memory_full_ratio());
    }
}
