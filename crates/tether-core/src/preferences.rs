//! Preference boundary trait and typed accessors.
//!
//! The engine treats preferences as simple key/value inputs read once at
//! startup and written on every change. Storage lives behind
//! [`PreferenceRepository`]; `tether-infrastructure` provides the JSON file
//! implementation.

use std::sync::Arc;

use tether_types::DashboardSortMode;

/// Keys used by the engine. Kept together so the storage file stays
/// greppable.
pub mod keys {
    pub const SHOW_THINKING: &str = "show-thinking";
    pub const CLI_PATH_OVERRIDE: &str = "cli-path-override";
    pub const DASHBOARD_SORT_MODE: &str = "dashboard-sort-mode";
}

/// An abstract key/value store for user preferences.
pub trait PreferenceRepository: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Typed view over a [`PreferenceRepository`].
///
/// Write failures are logged and swallowed: a preference that fails to
/// persist must never take the session engine down.
#[derive(Clone)]
pub struct Preferences {
    repository: Arc<dyn PreferenceRepository>,
}

impl Preferences {
    pub fn new(repository: Arc<dyn PreferenceRepository>) -> Self {
        Self { repository }
    }

    /// Whether thinking events should be shown by the presentation layer.
    pub fn show_thinking(&self) -> bool {
        self.repository
            .get(keys::SHOW_THINKING)
            .map(|value| value == "true")
            .unwrap_or(false)
    }

    pub fn set_show_thinking(&self, value: bool) {
        self.write(keys::SHOW_THINKING, if value { "true" } else { "false" });
    }

    /// The CLI path override forwarded on spawn and resume; an empty stored
    /// string counts as unset.
    pub fn cli_path_override(&self) -> Option<String> {
        self.repository
            .get(keys::CLI_PATH_OVERRIDE)
            .filter(|value| !value.is_empty())
    }

    pub fn set_cli_path_override(&self, value: &str) {
        self.write(keys::CLI_PATH_OVERRIDE, value);
    }

    /// The persisted dashboard sort preference. Unknown or missing values
    /// fall back to the default active-first ordering.
    pub fn dashboard_sort_preference(&self) -> DashboardSortMode {
        self.repository
            .get(keys::DASHBOARD_SORT_MODE)
            .and_then(|value| DashboardSortMode::parse(&value))
            .unwrap_or_default()
    }

    pub fn set_dashboard_sort_preference(&self, mode: DashboardSortMode) {
        self.write(keys::DASHBOARD_SORT_MODE, mode.as_str());
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.repository.set(key, value) {
            tracing::warn!("[Preferences] failed to persist {key}: {err}");
        }
    }
}
