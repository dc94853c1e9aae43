use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use driftspace_core::{File, Folder, Workspace};
use driftspace_sync::Membership;

/// Workspace database row
#[derive(Debug, Clone, FromRow)]
pub struct WorkspaceRow {
    pub id: Uuid,
    pub title: String,
    pub icon_id: String,
    pub data: Option<String>,
    pub in_trash: Option<String>,
    pub logo: Option<String>,
    pub banner_url: Option<String>,
    pub workspace_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_modified_by: Option<Uuid>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Workspace {
            id: row.id,
            title: row.title,
            icon_id: row.icon_id,
            data: row.data,
            in_trash: row.in_trash,
            logo: row.logo,
            banner_url: row.banner_url,
            workspace_owner: row.workspace_owner,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_modified_by: row.last_modified_by,
        }
    }
}

/// Folder database row
#[derive(Debug, Clone, FromRow)]
pub struct FolderRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub icon_id: String,
    pub data: Option<String>,
    pub in_trash: Option<String>,
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_modified_by: Option<Uuid>,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id,
            workspace_id: row.workspace_id,
            title: row.title,
            icon_id: row.icon_id,
            data: row.data,
            in_trash: row.in_trash,
            banner_url: row.banner_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_modified_by: row.last_modified_by,
        }
    }
}

/// File database row
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub folder_id: Uuid,
    pub title: String,
    pub icon_id: String,
    pub data: Option<String>,
    pub in_trash: Option<String>,
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_modified_by: Option<Uuid>,
}

impl From<FileRow> for File {
    fn from(row: FileRow) -> Self {
        File {
            id: row.id,
            workspace_id: row.workspace_id,
            folder_id: row.folder_id,
            title: row.title,
            icon_id: row.icon_id,
            data: row.data,
            in_trash: row.in_trash,
            banner_url: row.banner_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_modified_by: row.last_modified_by,
        }
    }
}

/// Collaborator membership row
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            id: row.id,
            workspace_id: row.workspace_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}
