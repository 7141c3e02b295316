//! Dashboard-facing vocabulary: locked status set, sort modes, derived rows.

use serde::{Deserialize, Serialize};

/// The locked five-state vocabulary shown on the dashboard.
///
/// Raw backend statuses are folded into this set by
/// `tether_core::session::status::dashboard_status`. The mapping is total:
/// any value the classifier does not recognize lands on `Starting`, the
/// least alarming state, never on `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DashboardStatus {
    Starting,
    Running,
    Completed,
    Interrupted,
    Failed,
}

/// Row ordering for the dashboard list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardSortMode {
    /// Sessions still doing work sort before settled ones; newest-created
    /// first within each group.
    #[default]
    ActiveFirstThenRecent,
    /// Creation time descending.
    Recent,
    /// Creation time ascending.
    Oldest,
}

impl DashboardSortMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DashboardSortMode::ActiveFirstThenRecent => "active-first-then-recent",
            DashboardSortMode::Recent => "recent",
            DashboardSortMode::Oldest => "oldest",
        }
    }

    /// Parses the persisted preference string; unknown values are `None` so
    /// callers can fall back to the default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active-first-then-recent" => Some(DashboardSortMode::ActiveFirstThenRecent),
            "recent" => Some(DashboardSortMode::Recent),
            "oldest" => Some(DashboardSortMode::Oldest),
            _ => None,
        }
    }
}

/// One derived dashboard row. Never persisted; recomputed from the session
/// directory, the event log and the wall clock on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSessionRow {
    pub id: String,
    pub name: String,
    pub status: DashboardStatus,
    /// Compact age label for the last update, e.g. `12s`, `3m`, `2h`, `5d`.
    pub recent_activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub restored: bool,
    /// Only meaningful while `status` is `Running`.
    pub recovery_hint: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_mode_strings_round_trip() {
        for mode in [
            DashboardSortMode::ActiveFirstThenRecent,
            DashboardSortMode::Recent,
            DashboardSortMode::Oldest,
        ] {
            assert_eq!(DashboardSortMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(DashboardSortMode::parse("newest"), None);
    }
}
