use thiserror::Error;
use uuid::Uuid;

use crate::entity::EntityKind;

/// Errors returned by the Tree Store's mutators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("{kind} {id} already present")]
    Duplicate { kind: EntityKind, id: Uuid },

    #[error("{kind} {id} references missing parent {parent}")]
    MissingParent {
        kind: EntityKind,
        id: Uuid,
        parent: Uuid,
    },

    #[error("folder {folder} is not in workspace {workspace}")]
    WorkspaceMismatch { folder: Uuid, workspace: Uuid },
}
