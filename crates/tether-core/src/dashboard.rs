//! Dashboard projection.
//!
//! Pure derivation from the session directory, the event log and a wall
//! clock instant. Nothing here mutates state; the application layer calls
//! [`project_rows`] whenever any input changes.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tether_types::{DashboardSessionRow, DashboardSortMode, DashboardStatus, SessionEvent};

use crate::session::status::{dashboard_status, is_active_status, is_failure_status};
use crate::session::{EventLog, Session};

/// Parses an RFC 3339 timestamp to epoch milliseconds; unparseable values
/// sort as the epoch so a malformed row sinks instead of crashing the view.
pub fn to_epoch_millis(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.timestamp_millis())
        .unwrap_or(0)
}

/// Buckets elapsed time since `timestamp` into a compact label using the
/// 60/60/24 thresholds: `42s`, `5m`, `3h`, `2d`. Clock skew (timestamp in
/// the future) clamps to `0s`.
pub fn compact_age_label(timestamp: &str, now: DateTime<Utc>) -> String {
    let age_ms = (now.timestamp_millis() - to_epoch_millis(timestamp)).max(0);
    let age_seconds = age_ms / 1000;
    if age_seconds < 60 {
        return format!("{age_seconds}s");
    }

    let age_minutes = age_seconds / 60;
    if age_minutes < 60 {
        return format!("{age_minutes}m");
    }

    let age_hours = age_minutes / 60;
    if age_hours < 24 {
        return format!("{age_hours}h");
    }

    format!("{}d", age_hours / 24)
}

/// Collapses all whitespace runs to single spaces and trims.
pub fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn by_created_at_desc(left: &Session, right: &Session) -> Ordering {
    match to_epoch_millis(&right.created_at).cmp(&to_epoch_millis(&left.created_at)) {
        // Ties break by id descending so the order is deterministic and not
        // timestamp-dependent.
        Ordering::Equal => right.id.cmp(&left.id),
        other => other,
    }
}

/// Returns the sessions ordered for the given sort mode.
pub fn sort_sessions(sessions: &[Session], mode: DashboardSortMode) -> Vec<Session> {
    let mut sorted = sessions.to_vec();
    match mode {
        DashboardSortMode::Oldest => {
            sorted.sort_by(|left, right| by_created_at_desc(left, right).reverse());
        }
        DashboardSortMode::Recent => {
            sorted.sort_by(by_created_at_desc);
        }
        DashboardSortMode::ActiveFirstThenRecent => {
            sorted.sort_by(|left, right| {
                let left_active = is_active_status(&left.status);
                let right_active = is_active_status(&right.status);
                match (left_active, right_active) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => by_created_at_desc(left, right),
                }
            });
        }
    }
    sorted
}

/// Scans a session's log newest-to-oldest for the most recent explanation of
/// a failure: the last `error` event, or the last failure-status event that
/// carries a message. Returns a single-lined reason, or `None` when no event
/// yields one.
pub fn extract_failure_reason(events: &[SessionEvent]) -> Option<String> {
    for event in events.iter().rev() {
        match event {
            SessionEvent::Error { error, .. } => {
                let reason = single_line(error);
                if !reason.is_empty() {
                    return Some(reason);
                }
            }
            SessionEvent::Status {
                status, message, ..
            } if is_failure_status(status) => {
                let reason = single_line(message.as_deref().unwrap_or(""));
                if !reason.is_empty() {
                    return Some(reason);
                }
            }
            _ => {}
        }
    }

    None
}

/// Projects the full dashboard row set.
pub fn project_rows(
    sessions: &[Session],
    events: &EventLog,
    now: DateTime<Utc>,
    mode: DashboardSortMode,
) -> Vec<DashboardSessionRow> {
    sort_sessions(sessions, mode)
        .into_iter()
        .map(|session| {
            let status = dashboard_status(&session.status);

            let failure_reason = if status == DashboardStatus::Failed {
                extract_failure_reason(events.events(&session.id)).or_else(|| {
                    session
                        .failure_reason
                        .as_deref()
                        .map(single_line)
                        .filter(|reason| !reason.is_empty())
                })
            } else {
                None
            };

            DashboardSessionRow {
                id: session.id.clone(),
                name: session.name.clone(),
                status,
                recent_activity: compact_age_label(&session.updated_at, now),
                failure_reason,
                created_at: session.created_at.clone(),
                restored: session.restored,
                recovery_hint: session.recovery_hint && status == DashboardStatus::Running,
            }
        })
        .collect()
}
