//! Raw-status normalization and the locked dashboard classification.
//!
//! The backend's status vocabulary is open-ended; two closed views are
//! derived from it. `normalize` canonicalizes spelling variants, and
//! `dashboard_status` folds everything into the five-state dashboard set.
//! Both are total: no input panics, and anything unrecognized classifies as
//! `Starting` rather than `Failed`.

use tether_types::DashboardStatus;

/// Canonicalizes a raw backend status: lower-cases, folds `complete`/`done`
/// into `completed` and `error` into `failed`. Every other value passes
/// through unchanged, including the operational pseudo-statuses
/// `interrupting`, `resuming` and `interrupted`.
pub fn normalize(raw: &str) -> String {
    let normalized = raw.to_lowercase();
    match normalized.as_str() {
        "complete" | "done" => "completed".to_string(),
        "error" => "failed".to_string(),
        _ => normalized,
    }
}

/// True for statuses after which no further lifecycle progress occurs.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(normalize(status).as_str(), "completed" | "failed" | "killed")
}

/// The fixed failure set used for dashboard classification and failure-reason
/// extraction. Wider than the terminal set: it also covers spellings only
/// ever seen from older backends.
pub fn is_failure_status(status: &str) -> bool {
    matches!(
        normalize(status).as_str(),
        "failed" | "killed" | "error" | "cancelled" | "canceled" | "crashed"
    )
}

/// True for statuses that sort into the "still doing work" dashboard group.
pub fn is_active_status(status: &str) -> bool {
    matches!(
        normalize(status).as_str(),
        "starting" | "running" | "interrupting" | "resuming"
    )
}

/// Folds a raw status into the locked dashboard vocabulary.
///
/// Unrecognized values (`queued`, operation pseudo-statuses, anything a
/// future backend invents) classify as `Starting`.
pub fn dashboard_status(raw: &str) -> DashboardStatus {
    let normalized = normalize(raw);

    if normalized == "interrupted" {
        return DashboardStatus::Interrupted;
    }

    if normalized == "running" {
        return DashboardStatus::Running;
    }

    if normalized == "completed" {
        return DashboardStatus::Completed;
    }

    if is_failure_status(&normalized) {
        return DashboardStatus::Failed;
    }

    DashboardStatus::Starting
}
