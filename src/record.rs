//! Persistence of finished games.

use crate::go::GoGame;
use derive_more::{Display, Error};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Receives each finished game with its index and title.
pub trait GameRecorder: Send {
    /// Persists one finished game.
    fn record(&mut self, index: usize, game: &GoGame, title: &str) -> Result<(), RecordError>;
}

/// Writes one `game_<index>.sgf` file per game into a directory.
#[derive(Debug, Clone)]
pub struct SgfRecorder {
    dir: PathBuf,
}

impl SgfRecorder {
    /// Creates the output directory if needed.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, RecordError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            RecordError::new(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        info!(dir = %dir.display(), "Logging SGF game files");
        Ok(Self { dir })
    }

    /// Path used for game `index`.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("game_{}.sgf", index))
    }
}

impl GameRecorder for SgfRecorder {
    #[instrument(skip(self, game, title))]
    fn record(&mut self, index: usize, game: &GoGame, title: &str) -> Result<(), RecordError> {
        let path = self.path_for(index);
        std::fs::write(&path, game.to_sgf(title))
            .map_err(|e| RecordError::new(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Wrote SGF");
        Ok(())
    }
}

/// Game record error.
#[derive(Debug, Clone, Display, Error)]
#[display("Record error: {} at {}:{}", message, file, line)]
pub struct RecordError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RecordError {
    /// Creates a new record error with caller location tracking.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
