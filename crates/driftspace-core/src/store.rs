use std::collections::HashMap;

use uuid::Uuid;

use crate::entity::{
    DocumentRef, Entity, EntityKind, File, FilePatch, Folder, FolderPatch, Workspace,
    WorkspacePatch,
};
use crate::error::StoreError;

/// Subtree removed by a cascade delete, in re-insertable form
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub workspaces: Vec<Workspace>,
    pub folders: Vec<Folder>,
    pub files: Vec<File>,
}

impl Removed {
    fn empty() -> Self {
        Self {
            workspaces: Vec::new(),
            folders: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// Client-held source of truth for the currently known catalog.
///
/// Entities live in id-keyed arenas with parent-id back-references; child
/// lists are computed on demand, sorted by `created_at` ascending so display
/// order is stable regardless of network arrival order. Mutators are
/// synchronous, never perform I/O, and report failures explicitly.
#[derive(Debug, Default)]
pub struct TreeStore {
    workspaces: HashMap<Uuid, Workspace>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, File>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- selectors ---

    pub fn workspace(&self, id: Uuid) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.get(&id)
    }

    pub fn file(&self, id: Uuid) -> Option<&File> {
        self.files.get(&id)
    }

    /// Workspace copy without the heavy `data` payload, for list views
    pub fn workspace_shallow(&self, id: Uuid) -> Option<Workspace> {
        self.workspaces.get(&id).map(|w| Workspace {
            data: None,
            ..w.clone()
        })
    }

    /// Folder copy without the heavy `data` payload
    pub fn folder_shallow(&self, id: Uuid) -> Option<Folder> {
        self.folders.get(&id).map(|f| Folder {
            data: None,
            ..f.clone()
        })
    }

    /// File copy without the heavy `data` payload
    pub fn file_shallow(&self, id: Uuid) -> Option<File> {
        self.files.get(&id).map(|f| File {
            data: None,
            ..f.clone()
        })
    }

    /// Entity addressed by an open-document locator
    pub fn find(&self, doc: &DocumentRef) -> Option<Entity> {
        match *doc {
            DocumentRef::Workspace { id } => self.workspace(id).cloned().map(Entity::Workspace),
            DocumentRef::Folder { id, .. } => self.folder(id).cloned().map(Entity::Folder),
            DocumentRef::File { id, .. } => self.file(id).cloned().map(Entity::File),
        }
    }

    /// All known workspaces, oldest first
    pub fn workspaces(&self) -> Vec<&Workspace> {
        let mut all: Vec<&Workspace> = self.workspaces.values().collect();
        all.sort_by_key(|w| (w.created_at, w.id));
        all
    }

    /// Folders of a workspace, oldest first
    pub fn folders_of(&self, workspace_id: Uuid) -> Vec<&Folder> {
        let mut children: Vec<&Folder> = self
            .folders
            .values()
            .filter(|f| f.workspace_id == workspace_id)
            .collect();
        children.sort_by_key(|f| (f.created_at, f.id));
        children
    }

    /// Files of a folder, oldest first
    pub fn files_of(&self, folder_id: Uuid) -> Vec<&File> {
        let mut children: Vec<&File> = self
            .files
            .values()
            .filter(|f| f.folder_id == folder_id)
            .collect();
        children.sort_by_key(|f| (f.created_at, f.id));
        children
    }

    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    // --- mutators ---

    pub fn add_workspace(&mut self, workspace: Workspace) -> Result<(), StoreError> {
        if self.workspaces.contains_key(&workspace.id) {
            return Err(StoreError::Duplicate {
                kind: EntityKind::Workspace,
                id: workspace.id,
            });
        }
        self.workspaces.insert(workspace.id, workspace);
        Ok(())
    }

    pub fn update_workspace(&mut self, id: Uuid, patch: WorkspacePatch) -> Result<(), StoreError> {
        let workspace = self.workspaces.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Workspace,
            id,
        })?;
        workspace.apply(patch);
        Ok(())
    }

    /// Removes a workspace and, transitively, its folders and files,
    /// mirroring the cascade performed at the persistence layer.
    pub fn delete_workspace(&mut self, id: Uuid) -> Result<Removed, StoreError> {
        let workspace = self.workspaces.remove(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Workspace,
            id,
        })?;

        let mut removed = Removed::empty();
        self.folders.retain(|_, f| {
            if f.workspace_id == id {
                removed.folders.push(f.clone());
                false
            } else {
                true
            }
        });
        self.files.retain(|_, f| {
            if f.workspace_id == id {
                removed.files.push(f.clone());
                false
            } else {
                true
            }
        });
        removed.workspaces.push(workspace);
        Ok(removed)
    }

    pub fn add_folder(&mut self, folder: Folder) -> Result<(), StoreError> {
        if self.folders.contains_key(&folder.id) {
            return Err(StoreError::Duplicate {
                kind: EntityKind::Folder,
                id: folder.id,
            });
        }
        if !self.workspaces.contains_key(&folder.workspace_id) {
            return Err(StoreError::MissingParent {
                kind: EntityKind::Folder,
                id: folder.id,
                parent: folder.workspace_id,
            });
        }
        self.folders.insert(folder.id, folder);
        Ok(())
    }

    pub fn update_folder(&mut self, id: Uuid, patch: FolderPatch) -> Result<(), StoreError> {
        let folder = self.folders.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Folder,
            id,
        })?;
        folder.apply(patch);
        Ok(())
    }

    /// Removes a folder and its files
    pub fn delete_folder(&mut self, id: Uuid) -> Result<Removed, StoreError> {
        let folder = self.folders.remove(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Folder,
            id,
        })?;

        let mut removed = Removed::empty();
        self.files.retain(|_, f| {
            if f.folder_id == id {
                removed.files.push(f.clone());
                false
            } else {
                true
            }
        });
        removed.folders.push(folder);
        Ok(removed)
    }

    pub fn add_file(&mut self, file: File) -> Result<(), StoreError> {
        if self.files.contains_key(&file.id) {
            return Err(StoreError::Duplicate {
                kind: EntityKind::File,
                id: file.id,
            });
        }
        let folder = self
            .folders
            .get(&file.folder_id)
            .ok_or(StoreError::MissingParent {
                kind: EntityKind::File,
                id: file.id,
                parent: file.folder_id,
            })?;
        if folder.workspace_id != file.workspace_id {
            return Err(StoreError::WorkspaceMismatch {
                folder: folder.id,
                workspace: file.workspace_id,
            });
        }
        self.files.insert(file.id, file);
        Ok(())
    }

    pub fn update_file(&mut self, id: Uuid, patch: FilePatch) -> Result<(), StoreError> {
        let file = self.files.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::File,
            id,
        })?;
        file.apply(patch);
        Ok(())
    }

    pub fn delete_file(&mut self, id: Uuid) -> Result<Removed, StoreError> {
        let file = self.files.remove(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::File,
            id,
        })?;
        let mut removed = Removed::empty();
        removed.files.push(file);
        Ok(removed)
    }

    /// Replaces the folder set of a workspace. Folders that disappear take
    /// their files with them; surviving folders keep theirs.
    pub fn set_folders(
        &mut self,
        workspace_id: Uuid,
        folders: Vec<Folder>,
    ) -> Result<(), StoreError> {
        if !self.workspaces.contains_key(&workspace_id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Workspace,
                id: workspace_id,
            });
        }

        let incoming: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
        let dropped: Vec<Uuid> = self
            .folders
            .values()
            .filter(|f| f.workspace_id == workspace_id && !incoming.contains(&f.id))
            .map(|f| f.id)
            .collect();
        for id in dropped {
            self.folders.remove(&id);
            self.files.retain(|_, f| f.folder_id != id);
        }

        for mut folder in folders {
            folder.workspace_id = workspace_id;
            self.folders.insert(folder.id, folder);
        }
        Ok(())
    }

    /// Replaces the file set of a folder
    pub fn set_files(&mut self, folder_id: Uuid, files: Vec<File>) -> Result<(), StoreError> {
        let workspace_id = self
            .folders
            .get(&folder_id)
            .map(|f| f.workspace_id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Folder,
                id: folder_id,
            })?;

        self.files.retain(|_, f| f.folder_id != folder_id);
        for mut file in files {
            file.folder_id = folder_id;
            file.workspace_id = workspace_id;
            self.files.insert(file.id, file);
        }
        Ok(())
    }

    /// Re-inserts a previously removed subtree, parents first
    pub fn restore(&mut self, removed: Removed) -> Result<(), StoreError> {
        for workspace in removed.workspaces {
            self.add_workspace(workspace)?;
        }
        for folder in removed.folders {
            self.add_folder(folder)?;
        }
        for file in removed.files {
            self.add_file(file)?;
        }
        Ok(())
    }

    /// Drops everything, e.g. on logout
    pub fn reset(&mut self) {
        self.workspaces.clear();
        self.folders.clear();
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn seeded() -> (TreeStore, Workspace, Folder, File) {
        let mut store = TreeStore::new();
        let workspace = Workspace::new("Product", "🚀", Uuid::new_v4());
        let folder = Folder::new(workspace.id, "Specs", "🗂");
        let file = File::new(workspace.id, folder.id, "Notes", "📄");
        store.add_workspace(workspace.clone()).unwrap();
        store.add_folder(folder.clone()).unwrap();
        store.add_file(file.clone()).unwrap();
        (store, workspace, folder, file)
    }

    #[test]
    fn test_selectors() {
        let (store, workspace, folder, file) = seeded();
        assert_eq!(store.workspace(workspace.id), Some(&workspace));
        assert_eq!(store.folder(folder.id), Some(&folder));
        assert_eq!(store.file(file.id), Some(&file));
        assert_eq!(store.workspace(Uuid::new_v4()), None);
    }

    #[test]
    fn test_shallow_selectors_omit_data() {
        let (mut store, workspace, folder, file) = seeded();
        store
            .update_file(
                file.id,
                FilePatch {
                    data: Some(Some("{\"ops\":[]}".into())),
                    ..Default::default()
                },
            )
            .unwrap();

        let shallow = store.file_shallow(file.id).unwrap();
        assert_eq!(shallow.data, None);
        assert_eq!(shallow.title, file.title);
        // full variant still carries the payload
        assert_eq!(store.file(file.id).unwrap().data.as_deref(), Some("{\"ops\":[]}"));

        assert!(store.workspace_shallow(workspace.id).is_some());
        assert!(store.folder_shallow(folder.id).is_some());
    }

    #[test]
    fn test_children_sorted_by_created_at_regardless_of_insertion_order() {
        let (mut store, workspace, _, _) = seeded();

        let mut late = Folder::new(workspace.id, "Later", "🕐");
        late.created_at = Utc::now() + Duration::seconds(60);
        let mut early = Folder::new(workspace.id, "Earlier", "🕑");
        early.created_at = Utc::now() - Duration::seconds(60);

        // network arrival order: late first
        store.add_folder(late.clone()).unwrap();
        store.add_folder(early.clone()).unwrap();

        let titles: Vec<&str> = store
            .folders_of(workspace.id)
            .iter()
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Earlier", "Specs", "Later"]);
    }

    #[test]
    fn test_add_folder_requires_known_workspace() {
        let mut store = TreeStore::new();
        let folder = Folder::new(Uuid::new_v4(), "Orphan", "🗂");
        let err = store.add_folder(folder.clone()).unwrap_err();
        assert_eq!(
            err,
            StoreError::MissingParent {
                kind: EntityKind::Folder,
                id: folder.id,
                parent: folder.workspace_id,
            }
        );
    }

    #[test]
    fn test_add_file_rejects_workspace_mismatch() {
        let (mut store, _, folder, _) = seeded();
        let other_workspace = Workspace::new("Other", "🌙", Uuid::new_v4());
        store.add_workspace(other_workspace.clone()).unwrap();

        let stray = File::new(other_workspace.id, folder.id, "Stray", "📄");
        let err = store.add_file(stray).unwrap_err();
        assert_eq!(
            err,
            StoreError::WorkspaceMismatch {
                folder: folder.id,
                workspace: other_workspace.id,
            }
        );
    }

    #[test]
    fn test_duplicate_add_is_an_error() {
        let (mut store, workspace, _, _) = seeded();
        let err = store.add_workspace(workspace.clone()).unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                kind: EntityKind::Workspace,
                id: workspace.id,
            }
        );
    }

    #[test]
    fn test_delete_workspace_cascades_folders_and_files() {
        let (mut store, workspace, folder, file) = seeded();
        let second = File::new(workspace.id, folder.id, "Second", "📄");
        store.add_file(second).unwrap();

        let removed = store.delete_workspace(workspace.id).unwrap();

        assert_eq!(store.workspace_count(), 0);
        assert_eq!(store.folder_count(), 0);
        assert_eq!(store.file_count(), 0);
        assert_eq!(removed.workspaces.len(), 1);
        assert_eq!(removed.folders.len(), 1);
        assert_eq!(removed.files.len(), 2);
        assert!(removed.files.iter().any(|f| f.id == file.id));
    }

    #[test]
    fn test_delete_folder_cascades_files_only() {
        let (mut store, workspace, folder, _) = seeded();
        let removed = store.delete_folder(folder.id).unwrap();

        assert!(store.workspace(workspace.id).is_some());
        assert_eq!(store.folder_count(), 0);
        assert_eq!(store.file_count(), 0);
        assert_eq!(removed.files.len(), 1);
    }

    #[test]
    fn test_restore_round_trips_a_cascade() {
        let (mut store, workspace, _, _) = seeded();
        let removed = store.delete_workspace(workspace.id).unwrap();
        store.restore(removed).unwrap();

        assert_eq!(store.workspace_count(), 1);
        assert_eq!(store.folder_count(), 1);
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn test_set_folders_replaces_and_cascades_dropped_children() {
        let (mut store, workspace, folder, _) = seeded();
        let replacement = Folder::new(workspace.id, "Fresh", "✨");

        store
            .set_folders(workspace.id, vec![replacement.clone()])
            .unwrap();

        assert!(store.folder(folder.id).is_none());
        assert!(store.folder(replacement.id).is_some());
        // the dropped folder's files went with it
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn test_set_folders_keeps_files_of_surviving_folders() {
        let (mut store, workspace, folder, file) = seeded();
        let mut renamed = folder.clone();
        renamed.title = "Specs v2".into();

        store.set_folders(workspace.id, vec![renamed]).unwrap();

        assert_eq!(store.folder(folder.id).unwrap().title, "Specs v2");
        assert!(store.file(file.id).is_some());
    }

    #[test]
    fn test_set_files_replaces_collection() {
        let (mut store, _, folder, file) = seeded();
        let fresh = File::new(folder.workspace_id, folder.id, "Fresh", "✨");

        store.set_files(folder.id, vec![fresh.clone()]).unwrap();

        assert!(store.file(file.id).is_none());
        assert!(store.file(fresh.id).is_some());
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let mut store = TreeStore::new();
        let id = Uuid::new_v4();
        let err = store.update_file(id, FilePatch::default()).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                kind: EntityKind::File,
                id,
            }
        );
    }

    #[test]
    fn test_find_by_document_ref() {
        let (store, workspace, folder, file) = seeded();
        let doc = DocumentRef::File {
            workspace_id: workspace.id,
            folder_id: folder.id,
            id: file.id,
        };
        match store.find(&doc) {
            Some(Entity::File(found)) => assert_eq!(found.id, file.id),
            other => panic!("expected file entity, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut store, ..) = seeded();
        store.reset();
        assert_eq!(store.workspace_count(), 0);
        assert_eq!(store.folder_count(), 0);
        assert_eq!(store.file_count(), 0);
    }
}
