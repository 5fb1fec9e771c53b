//! Tuning constants for the narrative graph engine.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration passed explicitly to engine entry points that need it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Turns without progress before a game counts as stuck.
    pub max_stuck_turns: usize,

    /// Fail-branch retries tolerated on a node.
    pub max_retries: u32,

    /// Resources whose depletion (`<= 0`) makes a game stuck.
    pub critical_resources: Vec<String>,

    /// Objective status that counts as completion.
    pub completed_status: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stuck_turns: 5,
            max_retries: 3,
            critical_resources: vec![
                "health".to_string(),
                "mana".to_string(),
                "stamina".to_string(),
            ],
            completed_status: "complete".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_max_stuck_turns(mut self, turns: usize) -> Self {
        self.max_stuck_turns = turns;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_critical_resources(mut self, resources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.critical_resources = resources.into_iter().map(Into::into).collect();
        self
    }
}
