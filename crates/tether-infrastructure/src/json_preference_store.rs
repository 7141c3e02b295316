//! JSON file preference store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tether_core::preferences::PreferenceRepository;

use crate::paths::TetherPaths;

/// File-backed key/value preference store.
///
/// The whole map is read once at construction and cached; every `set`
/// rewrites the file. Preference traffic is a handful of writes per user
/// action, so the simple whole-file strategy holds.
pub struct JsonPreferenceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonPreferenceStore {
    /// Opens the store at the platform-default location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::with_path(TetherPaths::default().preferences_file()?))
    }

    /// Opens the store at a custom path. A missing or unreadable file
    /// degrades to an empty map; preferences must never block startup.
    pub fn with_path(path: PathBuf) -> Self {
        let values = match Self::load(&path) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(
                    "[Preferences] failed to load {}: {err:#}",
                    path.display()
                );
                HashMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn load(path: &PathBuf) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let serialized = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl PreferenceRepository for JsonPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }
}
