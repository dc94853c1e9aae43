use thiserror::Error;
use uuid::Uuid;

use driftspace_core::{File, FilePatch, Folder, FolderPatch, Workspace, WorkspacePatch};

/// Failure reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// The server re-checked membership and said no
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Server-side persistence collaborator.
///
/// Owns the durable copy of the catalog. Every operation is keyed by entity
/// id; updates accept a partial field set including `last_modified_by`;
/// deletes cascade to children server-side. The implementation re-verifies
/// ownership/collaboration membership on every write — the client's
/// optimistic view is provisional until one of these calls confirms it.
#[allow(async_fn_in_trait)]
pub trait Persistence {
    async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, PersistError>;
    async fn update_workspace(
        &self,
        id: Uuid,
        patch: WorkspacePatch,
    ) -> Result<Workspace, PersistError>;
    async fn delete_workspace(&self, id: Uuid) -> Result<(), PersistError>;

    async fn create_folder(&self, folder: Folder) -> Result<Folder, PersistError>;
    async fn update_folder(&self, id: Uuid, patch: FolderPatch) -> Result<Folder, PersistError>;
    async fn delete_folder(&self, id: Uuid) -> Result<(), PersistError>;

    async fn create_file(&self, file: File) -> Result<File, PersistError>;
    async fn update_file(&self, id: Uuid, patch: FilePatch) -> Result<File, PersistError>;
    async fn delete_file(&self, id: Uuid) -> Result<(), PersistError>;
}
