// Generation config, loaded from JSON.
//
// Every field has a default, so a config file only needs the keys it
// changes. The CLI layers its flags on top of whatever the file says.

use crate::error::ScheduleError;
use crate::formula::FormulaPolicy;
use crate::scheduler::ScheduleOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed for the line's `LineRng`.
    pub seed: u64,
    /// Register slider, 0 (full [60, 84]) to 1 (narrowest band).
    pub slider: f64,
    /// Tempo written into MIDI output (quarter notes per minute).
    pub tempo_bpm: u16,
    pub policy: Option<FormulaPolicy>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            seed: 1,
            slider: 0.0,
            tempo_bpm: 160,
            policy: None,
        }
    }
}

impl GenerationConfig {
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScheduleError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScheduleError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions {
            slider: self.slider,
            policy: self.policy.clone(),
        }
    }
}
