use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use driftspace_core::{File, Folder, Workspace};

/// Kind of committed row mutation carried by the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Membership row linking a user to a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Change-data-capture notification for one committed row mutation.
///
/// Events are self-contained: `new`/`old` carry full-row snapshots
/// including `last_modified_by`, so no ordering is required across tables
/// or within a table's delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ChangeEvent {
    Workspaces {
        kind: ChangeKind,
        new: Option<Workspace>,
        old: Option<Workspace>,
    },
    Folders {
        kind: ChangeKind,
        new: Option<Folder>,
        old: Option<Folder>,
    },
    Files {
        kind: ChangeKind,
        new: Option<File>,
        old: Option<File>,
    },
    Collaborators {
        kind: ChangeKind,
        new: Option<Membership>,
        old: Option<Membership>,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Workspaces { kind, .. }
            | ChangeEvent::Folders { kind, .. }
            | ChangeEvent::Files { kind, .. }
            | ChangeEvent::Collaborators { kind, .. } => *kind,
        }
    }

    /// Mutation tag of the session that produced this event: taken from the
    /// new row for inserts/updates and from the old row for deletes.
    pub fn actor(&self) -> Option<Uuid> {
        match self {
            ChangeEvent::Workspaces { kind, new, old } => match kind {
                ChangeKind::Delete => old.as_ref().and_then(|w| w.last_modified_by),
                _ => new.as_ref().and_then(|w| w.last_modified_by),
            },
            ChangeEvent::Folders { kind, new, old } => match kind {
                ChangeKind::Delete => old.as_ref().and_then(|f| f.last_modified_by),
                _ => new.as_ref().and_then(|f| f.last_modified_by),
            },
            ChangeEvent::Files { kind, new, old } => match kind {
                ChangeKind::Delete => old.as_ref().and_then(|f| f.last_modified_by),
                _ => new.as_ref().and_then(|f| f.last_modified_by),
            },
            ChangeEvent::Collaborators { .. } => None,
        }
    }
}
