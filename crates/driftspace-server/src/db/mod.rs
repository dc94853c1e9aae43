pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use driftspace_core::{File, FilePatch, Folder, FolderPatch, Workspace, WorkspacePatch};
use driftspace_sync::Membership;

use crate::error::AppError;
use models::{FileRow, FolderRow, MembershipRow, WorkspaceRow};

const WORKSPACE_COLS: &str =
    "id, title, icon_id, data, in_trash, logo, banner_url, workspace_owner, created_at, \
     updated_at, last_modified_by";
const FOLDER_COLS: &str = "id, workspace_id, title, icon_id, data, in_trash, banner_url, \
     created_at, updated_at, last_modified_by";
const FILE_COLS: &str = "id, workspace_id, folder_id, title, icon_id, data, in_trash, \
     banner_url, created_at, updated_at, last_modified_by";

/// Database connection wrapper.
///
/// Every write re-verifies that the acting user owns the workspace or is a
/// collaborator on it; the client's optimistic view is provisional until a
/// call here confirms it. Hard deletes cascade to children through the
/// schema's foreign keys.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Workspaces the user owns or collaborates on, oldest first
    pub async fn list_workspaces(&self, user_id: Uuid) -> Result<Vec<Workspace>, AppError> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLS} FROM workspaces w \
             WHERE w.workspace_owner = $1 \
                OR EXISTS (SELECT 1 FROM collaborators c \
                           WHERE c.workspace_id = w.id AND c.user_id = $1) \
             ORDER BY w.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a workspace the user can see
    pub async fn get_workspace(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Workspace>, AppError> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLS} FROM workspaces w \
             WHERE w.id = $1 \
               AND (w.workspace_owner = $2 \
                    OR EXISTS (SELECT 1 FROM collaborators c \
                               WHERE c.workspace_id = w.id AND c.user_id = $2))"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a workspace row as-is
    pub async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, AppError> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "INSERT INTO workspaces ({WORKSPACE_COLS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {WORKSPACE_COLS}"
        ))
        .bind(workspace.id)
        .bind(&workspace.title)
        .bind(&workspace.icon_id)
        .bind(&workspace.data)
        .bind(&workspace.in_trash)
        .bind(&workspace.logo)
        .bind(&workspace.banner_url)
        .bind(workspace.workspace_owner)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .bind(workspace.last_modified_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Merge a partial update into a workspace the user can write
    pub async fn update_workspace(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: WorkspacePatch,
    ) -> Result<Workspace, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLS} FROM workspaces w \
             WHERE w.id = $1 \
               AND (w.workspace_owner = $2 \
                    OR EXISTS (SELECT 1 FROM collaborators c \
                               WHERE c.workspace_id = w.id AND c.user_id = $2)) \
             FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AppError::NotFound(
                "workspace not found or unauthorized to update it".into(),
            ));
        };

        let mut workspace: Workspace = row.into();
        workspace.apply(patch);

        let updated = save_workspace(&mut tx, &workspace).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a workspace; only its owner may. Folders and files go with it
    /// through the schema cascade.
    pub async fn delete_workspace(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let deleted: Option<(Uuid,)> = sqlx::query_as(
            "DELETE FROM workspaces WHERE id = $1 AND workspace_owner = $2 RETURNING id",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if deleted.is_none() {
            return Err(AppError::NotFound(
                "workspace not found or only its owner can delete it".into(),
            ));
        }
        Ok(())
    }

    /// Folders of a workspace the user can see, oldest first
    pub async fn list_folders(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Folder>, AppError> {
        let rows = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {FOLDER_COLS} FROM folders f \
             WHERE f.workspace_id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = $1 \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             ORDER BY f.created_at"
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a folder if the user can write its workspace
    pub async fn create_folder(&self, folder: Folder, user_id: Uuid) -> Result<Folder, AppError> {
        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "INSERT INTO folders ({FOLDER_COLS}) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10 \
             WHERE EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = $2 \
                             AND (w.workspace_owner = $11 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $11))) \
             RETURNING {FOLDER_COLS}"
        ))
        .bind(folder.id)
        .bind(folder.workspace_id)
        .bind(&folder.title)
        .bind(&folder.icon_id)
        .bind(&folder.data)
        .bind(&folder.in_trash)
        .bind(&folder.banner_url)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .bind(folder.last_modified_by)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into).ok_or_else(|| {
            AppError::Unauthorized("not authorized to create a folder in this workspace".into())
        })
    }

    /// Merge a partial update into a folder the user can write
    pub async fn update_folder(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: FolderPatch,
    ) -> Result<Folder, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {FOLDER_COLS} FROM folders f \
             WHERE f.id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = f.workspace_id \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             FOR UPDATE OF f"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AppError::NotFound(
                "folder not found or unauthorized to update it".into(),
            ));
        };

        let mut folder: Folder = row.into();
        folder.apply(patch);

        let updated = save_folder(&mut tx, &folder).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a folder the user can write; its files cascade
    pub async fn delete_folder(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let deleted: Option<(Uuid,)> = sqlx::query_as(
            "DELETE FROM folders \
             WHERE id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = folders.workspace_id \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             RETURNING id",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if deleted.is_none() {
            return Err(AppError::NotFound(
                "folder not found or unauthorized to delete it".into(),
            ));
        }
        Ok(())
    }

    /// Files of a folder the user can see, oldest first
    pub async fn list_files(&self, folder_id: Uuid, user_id: Uuid) -> Result<Vec<File>, AppError> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLS} FROM files f \
             WHERE f.folder_id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = f.workspace_id \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             ORDER BY f.created_at"
        ))
        .bind(folder_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a file if the user can write its workspace
    pub async fn create_file(&self, file: File, user_id: Uuid) -> Result<File, AppError> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "INSERT INTO files ({FILE_COLS}) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11 \
             WHERE EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = $2 \
                             AND (w.workspace_owner = $12 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $12))) \
             RETURNING {FILE_COLS}"
        ))
        .bind(file.id)
        .bind(file.workspace_id)
        .bind(file.folder_id)
        .bind(&file.title)
        .bind(&file.icon_id)
        .bind(&file.data)
        .bind(&file.in_trash)
        .bind(&file.banner_url)
        .bind(file.created_at)
        .bind(file.updated_at)
        .bind(file.last_modified_by)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into).ok_or_else(|| {
            AppError::Unauthorized("not authorized to create a file in this workspace".into())
        })
    }

    /// Merge a partial update into a file the user can write
    pub async fn update_file(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: FilePatch,
    ) -> Result<File, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLS} FROM files f \
             WHERE f.id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = f.workspace_id \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             FOR UPDATE OF f"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AppError::NotFound(
                "file not found or unauthorized to update it".into(),
            ));
        };

        let mut file: File = row.into();
        file.apply(patch);

        let updated = save_file(&mut tx, &file).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a file the user can write
    pub async fn delete_file(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let deleted: Option<(Uuid,)> = sqlx::query_as(
            "DELETE FROM files \
             WHERE id = $1 \
               AND EXISTS (SELECT 1 FROM workspaces w \
                           WHERE w.id = files.workspace_id \
                             AND (w.workspace_owner = $2 \
                                  OR EXISTS (SELECT 1 FROM collaborators c \
                                             WHERE c.workspace_id = w.id AND c.user_id = $2))) \
             RETURNING id",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if deleted.is_none() {
            return Err(AppError::NotFound(
                "file not found or unauthorized to delete it".into(),
            ));
        }
        Ok(())
    }

    /// Collaborators of a workspace the user can see
    pub async fn list_collaborators(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Membership>, AppError> {
        self.require_access(workspace_id, user_id).await?;

        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT id, workspace_id, user_id, created_at FROM collaborators \
             WHERE workspace_id = $1 ORDER BY created_at",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a collaborator; the owner is skipped, duplicates are no-ops
    pub async fn add_collaborator(
        &self,
        workspace_id: Uuid,
        actor: Uuid,
        collaborator: Uuid,
    ) -> Result<(), AppError> {
        self.require_access(workspace_id, actor).await?;

        sqlx::query(
            "INSERT INTO collaborators (workspace_id, user_id) \
             SELECT w.id, $2 FROM workspaces w \
             WHERE w.id = $1 AND w.workspace_owner <> $2 \
             ON CONFLICT (workspace_id, user_id) DO NOTHING",
        )
        .bind(workspace_id)
        .bind(collaborator)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a collaborator from a workspace
    pub async fn remove_collaborator(
        &self,
        workspace_id: Uuid,
        actor: Uuid,
        collaborator: Uuid,
    ) -> Result<(), AppError> {
        self.require_access(workspace_id, actor).await?;

        sqlx::query("DELETE FROM collaborators WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(collaborator)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn require_access(&self, workspace_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let allowed: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM workspaces w \
             WHERE w.id = $1 \
               AND (w.workspace_owner = $2 \
                    OR EXISTS (SELECT 1 FROM collaborators c \
                               WHERE c.workspace_id = w.id AND c.user_id = $2)))",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !allowed.0 {
            return Err(AppError::Unauthorized(
                "workspace not found or not a member".into(),
            ));
        }
        Ok(())
    }
}

async fn save_workspace(
    tx: &mut Transaction<'_, Postgres>,
    workspace: &Workspace,
) -> Result<Workspace, AppError> {
    let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
        "UPDATE workspaces SET title = $2, icon_id = $3, data = $4, in_trash = $5, logo = $6, \
         banner_url = $7, workspace_owner = $8, last_modified_by = $9, updated_at = NOW() \
         WHERE id = $1 RETURNING {WORKSPACE_COLS}"
    ))
    .bind(workspace.id)
    .bind(&workspace.title)
    .bind(&workspace.icon_id)
    .bind(&workspace.data)
    .bind(&workspace.in_trash)
    .bind(&workspace.logo)
    .bind(&workspace.banner_url)
    .bind(workspace.workspace_owner)
    .bind(workspace.last_modified_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}

async fn save_folder(
    tx: &mut Transaction<'_, Postgres>,
    folder: &Folder,
) -> Result<Folder, AppError> {
    let row = sqlx::query_as::<_, FolderRow>(&format!(
        "UPDATE folders SET title = $2, icon_id = $3, data = $4, in_trash = $5, \
         banner_url = $6, last_modified_by = $7, updated_at = NOW() \
         WHERE id = $1 RETURNING {FOLDER_COLS}"
    ))
    .bind(folder.id)
    .bind(&folder.title)
    .bind(&folder.icon_id)
    .bind(&folder.data)
    .bind(&folder.in_trash)
    .bind(&folder.banner_url)
    .bind(folder.last_modified_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}

async fn save_file(tx: &mut Transaction<'_, Postgres>, file: &File) -> Result<File, AppError> {
    let row = sqlx::query_as::<_, FileRow>(&format!(
        "UPDATE files SET title = $2, icon_id = $3, data = $4, in_trash = $5, \
         banner_url = $6, last_modified_by = $7, updated_at = NOW() \
         WHERE id = $1 RETURNING {FILE_COLS}"
    ))
    .bind(file.id)
    .bind(&file.title)
    .bind(&file.icon_id)
    .bind(&file.data)
    .bind(&file.in_trash)
    .bind(&file.banner_url)
    .bind(file.last_modified_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}
