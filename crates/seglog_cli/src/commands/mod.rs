//! CLI command implementations.

pub mod append;
pub mod dump;
pub mod inspect;
pub mod verify;

use seglog_storage::{index_path, store_path, Config};
use std::path::{Path, PathBuf};

/// The segment a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    dir: PathBuf,
    base_offset: u64,
    config: Config,
}

impl Target {
    /// Creates a target for the segment at `base_offset` in `dir`.
    pub fn new(dir: PathBuf, base_offset: u64, config: Config) -> Self {
        Self {
            dir,
            base_offset,
            config,
        }
    }

    /// Directory holding the segment files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Base offset of the segment.
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Configuration used to open the segment.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the store file.
    pub fn store_path(&self) -> PathBuf {
        store_path(&self.dir, self.base_offset)
    }

    /// Path of the index file.
    pub fn index_path(&self) -> PathBuf {
        index_path(&self.dir, self.base_offset)
    }

    /// Fails unless both segment files already exist.
    ///
    /// Read-only commands use this so they never create an empty segment.
    pub fn require_existing(&self) -> Result<(), Box<dyn std::error::Error>> {
        for path in [self.store_path(), self.index_path()] {
            if !path.exists() {
                return Err(format!("Segment file not found: {}", path.display()).into());
            }
        }
        Ok(())
    }
}
