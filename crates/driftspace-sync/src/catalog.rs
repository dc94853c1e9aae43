use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use driftspace_core::{
    EntityKind, File, FilePatch, Folder, FolderPatch, MutationTag, StoreError, TreeStore,
    Workspace, WorkspacePatch,
};

use crate::persistence::{PersistError, Persistence};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// UI-facing catalog operations.
///
/// Each operation mutates the Tree Store optimistically, issues the tagged
/// persistence request, and rolls the store back to the exact pre-mutation
/// value when the server rejects the write. The optimistic view is always
/// provisional until the persistence call confirms it.
pub struct Catalog<P> {
    store: Arc<RwLock<TreeStore>>,
    persistence: P,
    tag: MutationTag,
}

impl<P: Persistence> Catalog<P> {
    pub fn new(store: Arc<RwLock<TreeStore>>, persistence: P, tag: MutationTag) -> Self {
        Self {
            store,
            persistence,
            tag,
        }
    }

    pub async fn create_workspace(&self, mut workspace: Workspace) -> Result<(), CatalogError> {
        workspace.last_modified_by = Some(self.tag.current());
        self.store.write().await.add_workspace(workspace.clone())?;

        if let Err(err) = self.persistence.create_workspace(workspace.clone()).await {
            let _ = self.store.write().await.delete_workspace(workspace.id);
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn update_workspace(
        &self,
        id: Uuid,
        patch: WorkspacePatch,
    ) -> Result<(), CatalogError> {
        let previous = {
            let mut store = self.store.write().await;
            let previous = store.workspace(id).cloned().ok_or(StoreError::NotFound {
                kind: EntityKind::Workspace,
                id,
            })?;
            store.update_workspace(id, patch.clone())?;
            previous
        };

        let tagged = WorkspacePatch {
            last_modified_by: Some(Some(self.tag.current())),
            ..patch
        };
        if let Err(err) = self.persistence.update_workspace(id, tagged).await {
            let _ = self
                .store
                .write()
                .await
                .update_workspace(id, previous.as_patch());
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn delete_workspace(&self, id: Uuid) -> Result<(), CatalogError> {
        let removed = self.store.write().await.delete_workspace(id)?;

        if let Err(err) = self.persistence.delete_workspace(id).await {
            if let Err(restore_err) = self.store.write().await.restore(removed) {
                tracing::error!(%restore_err, "rollback after failed workspace delete");
            }
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn create_folder(&self, mut folder: Folder) -> Result<(), CatalogError> {
        folder.last_modified_by = Some(self.tag.current());
        self.store.write().await.add_folder(folder.clone())?;

        if let Err(err) = self.persistence.create_folder(folder.clone()).await {
            let _ = self.store.write().await.delete_folder(folder.id);
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn update_folder(&self, id: Uuid, patch: FolderPatch) -> Result<(), CatalogError> {
        let previous = {
            let mut store = self.store.write().await;
            let previous = store.folder(id).cloned().ok_or(StoreError::NotFound {
                kind: EntityKind::Folder,
                id,
            })?;
            store.update_folder(id, patch.clone())?;
            previous
        };

        let tagged = FolderPatch {
            last_modified_by: Some(Some(self.tag.current())),
            ..patch
        };
        if let Err(err) = self.persistence.update_folder(id, tagged).await {
            let _ = self
                .store
                .write()
                .await
                .update_folder(id, previous.as_patch());
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn delete_folder(&self, id: Uuid) -> Result<(), CatalogError> {
        let removed = self.store.write().await.delete_folder(id)?;

        if let Err(err) = self.persistence.delete_folder(id).await {
            if let Err(restore_err) = self.store.write().await.restore(removed) {
                tracing::error!(%restore_err, "rollback after failed folder delete");
            }
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn create_file(&self, mut file: File) -> Result<(), CatalogError> {
        file.last_modified_by = Some(self.tag.current());
        self.store.write().await.add_file(file.clone())?;

        if let Err(err) = self.persistence.create_file(file.clone()).await {
            let _ = self.store.write().await.delete_file(file.id);
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn update_file(&self, id: Uuid, patch: FilePatch) -> Result<(), CatalogError> {
        let previous = {
            let mut store = self.store.write().await;
            let previous = store.file(id).cloned().ok_or(StoreError::NotFound {
                kind: EntityKind::File,
                id,
            })?;
            store.update_file(id, patch.clone())?;
            previous
        };

        let tagged = FilePatch {
            last_modified_by: Some(Some(self.tag.current())),
            ..patch
        };
        if let Err(err) = self.persistence.update_file(id, tagged).await {
            let _ = self.store.write().await.update_file(id, previous.as_patch());
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn delete_file(&self, id: Uuid) -> Result<(), CatalogError> {
        let removed = self.store.write().await.delete_file(id)?;

        if let Err(err) = self.persistence.delete_file(id).await {
            if let Err(restore_err) = self.store.write().await.restore(removed) {
                tracing::error!(%restore_err, "rollback after failed file delete");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Soft delete: sets the trash reason without removing the row
    pub async fn trash_folder(&self, id: Uuid, reason: &str) -> Result<(), CatalogError> {
        self.update_folder(
            id,
            FolderPatch {
                in_trash: Some(Some(reason.to_owned())),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn restore_folder(&self, id: Uuid) -> Result<(), CatalogError> {
        self.update_folder(
            id,
            FolderPatch {
                in_trash: Some(None),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn trash_file(&self, id: Uuid, reason: &str) -> Result<(), CatalogError> {
        self.update_file(
            id,
            FilePatch {
                in_trash: Some(Some(reason.to_owned())),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn restore_file(&self, id: Uuid) -> Result<(), CatalogError> {
        self.update_file(
            id,
            FilePatch {
                in_trash: Some(None),
                ..Default::default()
            },
        )
        .await
    }
}
