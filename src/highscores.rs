//! Per-difficulty high scores
//!
//! One best score per tier. Storage sits behind `HighScoreStore`; a failing
//! store never stops a session, callers log and fall back to zeros.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::sim::progression::Difficulty;

/// Best score per tier
///
/// Serialized as `{"easy": n, "normal": n, "hard": n, "extreme": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HighScores {
    pub easy: u64,
    pub normal: u64,
    pub hard: u64,
    pub extreme: u64,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tier: Difficulty) -> u64 {
        match tier {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
            Difficulty::Extreme => self.extreme,
        }
    }

    fn slot_mut(&mut self, tier: Difficulty) -> &mut u64 {
        match tier {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Normal => &mut self.normal,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Extreme => &mut self.extreme,
        }
    }

    /// Store `score` if it beats the tier's best; returns true on a new record
    pub fn record(&mut self, tier: Difficulty, score: u64) -> bool {
        let best = self.slot_mut(tier);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }
}

/// Persistence collaborator for high scores
pub trait HighScoreStore {
    fn load(&mut self) -> GameResult<HighScores>;
    fn save(&mut self, scores: &HighScores) -> GameResult<()>;
}

/// High scores kept in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn load(&mut self) -> GameResult<HighScores> {
        if !self.path.exists() {
            log::info!("No high scores found, starting fresh");
            return Ok(HighScores::new());
        }

        let json = fs::read_to_string(&self.path).map_err(|source| GameError::Io {
            path: self.path.clone(),
            source,
        })?;
        let scores = serde_json::from_str(&json).map_err(|source| GameError::Parse {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Loaded high scores from {}", self.path.display());
        Ok(scores)
    }

    fn save(&mut self, scores: &HighScores) -> GameResult<()> {
        let json = serde_json::to_string_pretty(scores).map_err(GameError::Serialize)?;
        fs::write(&self.path, json).map_err(|source| GameError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("High scores saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store, for tests and runs without a save file
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub scores: HighScores,
    /// Number of successful saves
    pub saves: usize,
}

impl MemoryStore {
    pub fn with_scores(scores: HighScores) -> Self {
        Self { scores, saves: 0 }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&mut self) -> GameResult<HighScores> {
        Ok(self.scores)
    }

    fn save(&mut self, scores: &HighScores) -> GameResult<()> {
        self.scores = *scores;
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("swift_orbit_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_record_only_on_improvement() {
        let mut scores = HighScores::new();
        assert!(scores.record(Difficulty::Hard, 1200));
        assert!(!scores.record(Difficulty::Hard, 1200));
        assert!(!scores.record(Difficulty::Hard, 800));
        assert!(scores.record(Difficulty::Hard, 1500));
        assert_eq!(scores.get(Difficulty::Hard), 1500);
        assert_eq!(scores.get(Difficulty::Easy), 0);
    }

    #[test]
    fn test_json_shape() {
        let scores = HighScores {
            easy: 1,
            normal: 2,
            hard: 3,
            extreme: 4,
        };
        let value = serde_json::to_value(scores).unwrap();
        assert_eq!(value["extreme"], 4);

        // Missing tiers default to zero
        let partial: HighScores = serde_json::from_str(r#"{"normal": 900}"#).unwrap();
        assert_eq!(partial.normal, 900);
        assert_eq!(partial.hard, 0);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = temp_path("roundtrip");
        let mut store = JsonFileStore::new(&path);
        let mut scores = HighScores::new();
        scores.record(Difficulty::Normal, 4200);

        store.save(&scores).unwrap();
        assert_eq!(store.load().unwrap(), scores);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_missing_is_empty() {
        let mut store = JsonFileStore::new(temp_path("missing_never_written"));
        assert_eq!(store.load().unwrap(), HighScores::new());
    }

    #[test]
    fn test_file_store_corrupt_is_parse_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(GameError::Parse { .. })));
        let _ = fs::remove_file(&path);
    }
}
