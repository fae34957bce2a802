//! Run settings and preferences
//!
//! Persisted as a small JSON file next to the save data.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, write_json_atomic};
use crate::sim::{Difficulty, FireBinding, MAX_RISK, RunConfig, Skill};

/// How difficulty is chosen for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyMode {
    /// Risk starts at 0 and climbs per room at the preset's rate
    Preset(Difficulty),
    /// Risk pinned for the whole run
    FixedRisk(u8),
}

impl Default for DifficultyMode {
    fn default() -> Self {
        DifficultyMode::Preset(Difficulty::Normal)
    }
}

impl DifficultyMode {
    /// Parse "easy"/"normal"/"hard" or a risk number 0-20
    pub fn from_str(s: &str) -> Option<Self> {
        if let Some(preset) = Difficulty::from_str(s) {
            return Some(DifficultyMode::Preset(preset));
        }
        let risk: u8 = s.trim().parse().ok()?;
        (risk <= MAX_RISK).then_some(DifficultyMode::FixedRisk(risk))
    }

    pub fn label(&self) -> String {
        match self {
            DifficultyMode::Preset(d) => d.as_str().to_string(),
            DifficultyMode::FixedRisk(r) => format!("Risk {}", r),
        }
    }
}

/// Player preferences for new runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: DifficultyMode,
    pub skill: Skill,
    /// Which control fires
    pub fire_binding: FireBinding,
    /// Fixed RNG seed; a fresh one is drawn per run when unset
    pub seed: Option<u64>,
    /// Silence presentation effects
    pub mute_effects: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyMode::default(),
            skill: Skill::RapidFire,
            fire_binding: FireBinding::Keyboard,
            seed: None,
            mute_effects: false,
        }
    }
}

impl Settings {
    /// Run configuration for a new run. Out-of-range risk is clamped.
    pub fn run_config(&self) -> RunConfig {
        let (difficulty, fixed_risk) = match self.difficulty {
            DifficultyMode::Preset(d) => (d, None),
            DifficultyMode::FixedRisk(r) => (Difficulty::Normal, Some(r.min(MAX_RISK))),
        };
        RunConfig {
            difficulty,
            fixed_risk,
            skill: self.skill,
            fire_binding: self.fire_binding,
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(json) = fs::read_to_string(path) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        write_json_atomic(path.as_ref(), self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
