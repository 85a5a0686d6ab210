//! Game settings
//!
//! Read from an optional JSON file; anything missing takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::error::{GameError, GameResult};
use crate::sim::progression::Difficulty;
use crate::sim::skills::SkillKind;
use crate::sim::state::{GameMode, normalize_loadout};

/// Which kind of session to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModeSetting {
    Normal {
        #[serde(default)]
        difficulty: Difficulty,
        /// Up to three skills bound to slots 1-3
        #[serde(default)]
        loadout: Vec<SkillKind>,
    },
    Roguelite,
}

impl Default for ModeSetting {
    fn default() -> Self {
        ModeSetting::Normal {
            difficulty: Difficulty::Normal,
            loadout: vec![SkillKind::Penetrate, SkillKind::Explode, SkillKind::Beam],
        }
    }
}

impl ModeSetting {
    pub fn game_mode(&self) -> GameMode {
        match self {
            ModeSetting::Normal { difficulty, .. } => GameMode::Normal(*difficulty),
            ModeSetting::Roguelite => GameMode::Roguelite,
        }
    }

    pub fn loadout(&self) -> &[SkillKind] {
        match self {
            ModeSetting::Normal { loadout, .. } => loadout,
            ModeSetting::Roguelite => &[],
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play field size
    pub width: f32,
    pub height: f32,
    /// RNG seed; `None` picks one from the clock
    pub seed: Option<u64>,
    pub mode: ModeSetting,
    /// High score file; `None` keeps scores in memory only
    pub high_score_path: Option<PathBuf>,
    /// Frames the headless demo runs before quitting
    pub demo_frames: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            seed: None,
            mode: ModeSetting::default(),
            high_score_path: Some(PathBuf::from("highscores.json")),
            demo_frames: 60 * 60 * 5,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> GameResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&json).map_err(|source| GameError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings.normalized())
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Drop duplicate or excess loadout skills and reject unusable field sizes
    pub fn normalized(mut self) -> Self {
        if let ModeSetting::Normal { loadout, .. } = &mut self.mode {
            *loadout = normalize_loadout(loadout);
        }
        if !(self.width > 0.0) || !(self.height > 0.0) {
            log::warn!("Invalid field size {}x{}, using default", self.width, self.height);
            self.width = CANVAS_WIDTH;
            self.height = CANVAS_HEIGHT;
        }
        self
    }
}
