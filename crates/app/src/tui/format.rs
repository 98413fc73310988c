use repodeck_core::app::ReconcileState;
use repodeck_core::domain::{ChangeStatus, IdentityKind, ProjectIdentity, Relation};

pub use repodeck_core::domain::format_name;

/// Card title for a project
pub fn identity_label(identity: &ProjectIdentity) -> String {
    match identity.kind() {
        IdentityKind::Unknown => "Unknown".to_string(),
        IdentityKind::Single(name) => format_name(name),
        IdentityKind::Both { remote, local } => {
            format!("{} ({})", format_name(remote), format_name(local))
        }
    }
}

pub fn relation_glyph(relation: Relation) -> &'static str {
    match relation {
        Relation::Ahead => "↑",
        Relation::Behind => "↓",
        Relation::Same => "=",
        Relation::Null => "·",
    }
}

pub fn relation_label(relation: Relation) -> &'static str {
    match relation {
        Relation::Ahead => "ahead",
        Relation::Behind => "behind",
        Relation::Same => "in sync",
        Relation::Null => "no reference",
    }
}

pub fn change_label(status: ChangeStatus, count: Option<usize>) -> String {
    match (status, count) {
        (ChangeStatus::Unknown, _) => "?".to_string(),
        (ChangeStatus::Clean, _) => "clean".to_string(),
        (ChangeStatus::Dirty, Some(1)) => "1 change".to_string(),
        (ChangeStatus::Dirty, Some(n)) => format!("{} changes", n),
        (ChangeStatus::Dirty, None) => "dirty".to_string(),
    }
}

pub fn state_label(state: ReconcileState) -> &'static str {
    match state {
        ReconcileState::Idle => "idle",
        ReconcileState::FetchingCommits => "fetching",
        ReconcileState::ClassifyingBranches => "classifying",
        ReconcileState::Ready => "ready",
    }
}

/// Time of the last completed listing, as UTC wall-clock time
pub fn refreshed_label(refreshed_at: Option<i64>) -> String {
    match refreshed_at {
        Some(at) => {
            let secs = at.rem_euclid(86_400);
            format!(
                "refreshed {:02}:{:02}:{:02} UTC",
                secs / 3600,
                secs % 3600 / 60,
                secs % 60
            )
        }
        None => "never refreshed".to_string(),
    }
}
