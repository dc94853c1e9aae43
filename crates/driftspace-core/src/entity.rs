use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maps a present-but-null JSON field to `Some(None)` ("clear the column"),
/// while an absent field stays `None` ("leave untouched").
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Discriminates the three catalog levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Workspace,
    Folder,
    File,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Workspace => write!(f, "workspace"),
            EntityKind::Folder => write!(f, "folder"),
            EntityKind::File => write!(f, "file"),
        }
    }
}

/// Top-level catalog entity owning folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub title: String,
    pub icon_id: String,
    /// Serialized document content; heavy, omitted by shallow selectors
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub in_trash: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub workspace_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mutation-session tag of the write that produced the current field
    /// values; echo suppression only, never authorization
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

impl Workspace {
    pub fn new(title: impl Into<String>, icon_id: impl Into<String>, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            icon_id: icon_id.into(),
            data: None,
            in_trash: None,
            logo: None,
            banner_url: None,
            workspace_owner: owner,
            created_at: now,
            updated_at: now,
            last_modified_by: None,
        }
    }

    /// Merge the set fields of a patch in place
    pub fn apply(&mut self, patch: WorkspacePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(icon_id) = patch.icon_id {
            self.icon_id = icon_id;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        if let Some(in_trash) = patch.in_trash {
            self.in_trash = in_trash;
        }
        if let Some(logo) = patch.logo {
            self.logo = logo;
        }
        if let Some(banner_url) = patch.banner_url {
            self.banner_url = banner_url;
        }
        if let Some(owner) = patch.workspace_owner {
            self.workspace_owner = owner;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(tag) = patch.last_modified_by {
            self.last_modified_by = tag;
        }
    }

    /// Patch that reproduces every mutable field of this row
    pub fn as_patch(&self) -> WorkspacePatch {
        WorkspacePatch {
            title: Some(self.title.clone()),
            icon_id: Some(self.icon_id.clone()),
            data: Some(self.data.clone()),
            in_trash: Some(self.in_trash.clone()),
            logo: Some(self.logo.clone()),
            banner_url: Some(self.banner_url.clone()),
            workspace_owner: Some(self.workspace_owner),
            updated_at: Some(self.updated_at),
            last_modified_by: Some(self.last_modified_by),
        }
    }
}

/// Partial update for a workspace. Inner `Option` distinguishes
/// "set to value" from "clear to null" on nullable columns; an outer
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspacePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_trash: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub logo: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub banner_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_owner: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified_by: Option<Option<Uuid>>,
}

/// Second catalog level, owned by a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    /// Immutable after creation
    pub workspace_id: Uuid,
    pub title: String,
    pub icon_id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub in_trash: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

impl Folder {
    pub fn new(workspace_id: Uuid, title: impl Into<String>, icon_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            title: title.into(),
            icon_id: icon_id.into(),
            data: None,
            in_trash: None,
            banner_url: None,
            created_at: now,
            updated_at: now,
            last_modified_by: None,
        }
    }

    pub fn apply(&mut self, patch: FolderPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(icon_id) = patch.icon_id {
            self.icon_id = icon_id;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        if let Some(in_trash) = patch.in_trash {
            self.in_trash = in_trash;
        }
        if let Some(banner_url) = patch.banner_url {
            self.banner_url = banner_url;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(tag) = patch.last_modified_by {
            self.last_modified_by = tag;
        }
    }

    pub fn as_patch(&self) -> FolderPatch {
        FolderPatch {
            title: Some(self.title.clone()),
            icon_id: Some(self.icon_id.clone()),
            data: Some(self.data.clone()),
            in_trash: Some(self.in_trash.clone()),
            banner_url: Some(self.banner_url.clone()),
            updated_at: Some(self.updated_at),
            last_modified_by: Some(self.last_modified_by),
        }
    }
}

/// Partial update for a folder. `workspace_id` is deliberately absent:
/// reparenting cannot be expressed as an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_trash: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub banner_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified_by: Option<Option<Uuid>>,
}

/// Leaf catalog entity, owned by a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: Uuid,
    /// Immutable after creation
    pub workspace_id: Uuid,
    /// Immutable after creation; must reference a folder in `workspace_id`
    pub folder_id: Uuid,
    pub title: String,
    pub icon_id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub in_trash: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

impl File {
    pub fn new(
        workspace_id: Uuid,
        folder_id: Uuid,
        title: impl Into<String>,
        icon_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            folder_id,
            title: title.into(),
            icon_id: icon_id.into(),
            data: None,
            in_trash: None,
            banner_url: None,
            created_at: now,
            updated_at: now,
            last_modified_by: None,
        }
    }

    pub fn apply(&mut self, patch: FilePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(icon_id) = patch.icon_id {
            self.icon_id = icon_id;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        if let Some(in_trash) = patch.in_trash {
            self.in_trash = in_trash;
        }
        if let Some(banner_url) = patch.banner_url {
            self.banner_url = banner_url;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(tag) = patch.last_modified_by {
            self.last_modified_by = tag;
        }
    }

    pub fn as_patch(&self) -> FilePatch {
        FilePatch {
            title: Some(self.title.clone()),
            icon_id: Some(self.icon_id.clone()),
            data: Some(self.data.clone()),
            in_trash: Some(self.in_trash.clone()),
            banner_url: Some(self.banner_url.clone()),
            updated_at: Some(self.updated_at),
            last_modified_by: Some(self.last_modified_by),
        }
    }
}

/// Partial update for a file. Parent ids are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_trash: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub banner_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified_by: Option<Option<Uuid>>,
}

/// Any catalog entity, tagged by level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Workspace(Workspace),
    Folder(Folder),
    File(File),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Workspace(_) => EntityKind::Workspace,
            Entity::Folder(_) => EntityKind::Folder,
            Entity::File(_) => EntityKind::File,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Entity::Workspace(w) => w.id,
            Entity::Folder(f) => f.id,
            Entity::File(f) => f.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Entity::Workspace(w) => &w.title,
            Entity::Folder(f) => &f.title,
            Entity::File(f) => &f.title,
        }
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            Entity::Workspace(w) => w.data.as_deref(),
            Entity::Folder(f) => f.data.as_deref(),
            Entity::File(f) => f.data.as_deref(),
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Entity::Workspace(w) => w.updated_at,
            Entity::Folder(f) => f.updated_at,
            Entity::File(f) => f.updated_at,
        }
    }
}

/// Locator for the document currently open in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentRef {
    Workspace { id: Uuid },
    Folder { workspace_id: Uuid, id: Uuid },
    File { workspace_id: Uuid, folder_id: Uuid, id: Uuid },
}

impl DocumentRef {
    pub fn id(&self) -> Uuid {
        match *self {
            DocumentRef::Workspace { id } => id,
            DocumentRef::Folder { id, .. } => id,
            DocumentRef::File { id, .. } => id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            DocumentRef::Workspace { .. } => EntityKind::Workspace,
            DocumentRef::Folder { .. } => EntityKind::Folder,
            DocumentRef::File { .. } => EntityKind::File,
        }
    }

    pub fn workspace_id(&self) -> Uuid {
        match *self {
            DocumentRef::Workspace { id } => id,
            DocumentRef::Folder { workspace_id, .. } => workspace_id,
            DocumentRef::File { workspace_id, .. } => workspace_id,
        }
    }

    /// Nearest ancestor to land on when this document disappears
    pub fn ancestor(&self) -> Location {
        match *self {
            DocumentRef::Workspace { .. } => Location::Dashboard,
            DocumentRef::Folder { workspace_id, .. } => Location::Workspace { id: workspace_id },
            DocumentRef::File {
                workspace_id,
                folder_id,
                ..
            } => Location::Folder {
                workspace_id,
                id: folder_id,
            },
        }
    }
}

/// Navigation target surfaced when the open document is removed remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Dashboard,
    Workspace { id: Uuid },
    Folder { workspace_id: Uuid, id: Uuid },
}
