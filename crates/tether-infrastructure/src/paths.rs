//! Centralized path management.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolves where Tether keeps its files on disk.
///
/// A custom base directory can be injected for tests; otherwise paths live
/// under the platform config directory.
#[derive(Debug, Clone, Default)]
pub struct TetherPaths {
    base: Option<PathBuf>,
}

impl TetherPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// The directory holding all Tether configuration.
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }

        let config = dirs::config_dir().context("platform config directory is unavailable")?;
        Ok(config.join("tether"))
    }

    /// The key/value preference file.
    pub fn preferences_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("preferences.json"))
    }
}
