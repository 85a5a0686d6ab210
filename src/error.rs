//! Error types for the game's external boundaries.
//!
//! Gameplay itself never fails: invalid skill activations and similar are
//! ordinary no-ops. Only persistence, configuration I/O and id parsing
//! produce errors, and callers log them and continue with defaults.

use std::fmt;
use std::path::PathBuf;

/// Top-level error enum for I/O at the edges of the core.
#[derive(Debug)]
pub enum GameError {
    /// A file could not be read or written.
    Io {
        /// File that was being accessed.
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file was read but its JSON contents were invalid.
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An in-memory value could not be serialized.
    Serialize(serde_json::Error),

    /// A difficulty id that names no tier.
    UnknownDifficulty(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Io { path, source } => {
                write!(f, "i/o error on '{}': {}", path.display(), source)
            }
            GameError::Parse { path, source } => {
                write!(f, "invalid JSON in '{}': {}", path.display(), source)
            }
            GameError::Serialize(source) => write!(f, "serialization failed: {}", source),
            GameError::UnknownDifficulty(id) => write!(f, "unknown difficulty '{}'", id),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Io { source, .. } => Some(source),
            GameError::Parse { source, .. } => Some(source),
            GameError::Serialize(source) => Some(source),
            GameError::UnknownDifficulty(_) => None,
        }
    }
}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;
