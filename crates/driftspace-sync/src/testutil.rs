//! In-memory fakes for the external collaborators, shared by the crate's
//! unit tests.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use driftspace_core::{
    File, FilePatch, Folder, FolderPatch, PeerColor, Workspace, WorkspacePatch,
};

use crate::editor::EditorBridge;
use crate::persistence::{PersistError, Persistence};
use crate::relay::{CursorRange, RelayChannel, RelayError, RelayFrame};

#[derive(Debug, Clone, PartialEq)]
pub enum PersistCall {
    CreateWorkspace(Uuid),
    UpdateWorkspace(Uuid, WorkspacePatch),
    DeleteWorkspace(Uuid),
    CreateFolder(Uuid),
    UpdateFolder(Uuid, FolderPatch),
    DeleteFolder(Uuid),
    CreateFile(Uuid),
    UpdateFile(Uuid, FilePatch),
    DeleteFile(Uuid),
}

/// Persistence collaborator that records calls and can be told to fail
#[derive(Debug, Default, Clone)]
pub struct FakePersistence {
    calls: Arc<Mutex<Vec<PersistCall>>>,
    failure: Arc<Mutex<Option<PersistError>>>,
}

impl FakePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: PersistError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<PersistCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PersistCall) -> Result<(), PersistError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Persistence for FakePersistence {
    async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, PersistError> {
        self.record(PersistCall::CreateWorkspace(workspace.id))?;
        Ok(workspace)
    }

    async fn update_workspace(
        &self,
        id: Uuid,
        patch: WorkspacePatch,
    ) -> Result<Workspace, PersistError> {
        self.record(PersistCall::UpdateWorkspace(id, patch))?;
        Ok(Workspace::new("persisted", "💾", Uuid::new_v4()))
    }

    async fn delete_workspace(&self, id: Uuid) -> Result<(), PersistError> {
        self.record(PersistCall::DeleteWorkspace(id))
    }

    async fn create_folder(&self, folder: Folder) -> Result<Folder, PersistError> {
        self.record(PersistCall::CreateFolder(folder.id))?;
        Ok(folder)
    }

    async fn update_folder(&self, id: Uuid, patch: FolderPatch) -> Result<Folder, PersistError> {
        self.record(PersistCall::UpdateFolder(id, patch))?;
        Ok(Folder::new(Uuid::new_v4(), "persisted", "💾"))
    }

    async fn delete_folder(&self, id: Uuid) -> Result<(), PersistError> {
        self.record(PersistCall::DeleteFolder(id))
    }

    async fn create_file(&self, file: File) -> Result<File, PersistError> {
        self.record(PersistCall::CreateFile(file.id))?;
        Ok(file)
    }

    async fn update_file(&self, id: Uuid, patch: FilePatch) -> Result<File, PersistError> {
        self.record(PersistCall::UpdateFile(id, patch))?;
        Ok(File::new(Uuid::new_v4(), Uuid::new_v4(), "persisted", "💾"))
    }

    async fn delete_file(&self, id: Uuid) -> Result<(), PersistError> {
        self.record(PersistCall::DeleteFile(id))
    }
}

/// Relay channel that collects broadcast frames
#[derive(Debug, Default, Clone)]
pub struct FakeChannel {
    sent: Arc<Mutex<Vec<RelayFrame>>>,
    closed: Arc<Mutex<bool>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<RelayFrame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

impl RelayChannel for FakeChannel {
    fn broadcast(&self, frame: RelayFrame) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::Closed);
        }
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

#[derive(Debug, Default)]
pub struct FakeEditorState {
    pub contents: serde_json::Value,
    pub char_len: usize,
    pub applied_remote: Vec<serde_json::Value>,
    pub cursors: Vec<(Uuid, String, PeerColor)>,
    pub moves: Vec<(Uuid, CursorRange)>,
    pub removed: Vec<Uuid>,
}

/// Editing-widget stand-in with inspectable state
#[derive(Debug, Default, Clone)]
pub struct FakeEditor {
    pub state: Arc<Mutex<FakeEditorState>>,
}

impl FakeEditor {
    pub fn with_contents(contents: serde_json::Value, char_len: usize) -> Self {
        let editor = Self::default();
        {
            let mut state = editor.state.lock().unwrap();
            state.contents = contents;
            state.char_len = char_len;
        }
        editor
    }
}

impl EditorBridge for FakeEditor {
    fn apply_remote(&mut self, delta: &serde_json::Value) {
        self.state.lock().unwrap().applied_remote.push(delta.clone());
    }

    fn set_contents(&mut self, snapshot: &serde_json::Value) {
        self.state.lock().unwrap().contents = snapshot.clone();
    }

    fn contents(&self) -> serde_json::Value {
        self.state.lock().unwrap().contents.clone()
    }

    fn char_len(&self) -> usize {
        self.state.lock().unwrap().char_len
    }

    fn create_cursor(&mut self, peer_id: Uuid, label: &str, color: PeerColor) {
        self.state
            .lock()
            .unwrap()
            .cursors
            .push((peer_id, label.to_owned(), color));
    }

    fn move_cursor(&mut self, peer_id: Uuid, range: CursorRange) {
        self.state.lock().unwrap().moves.push((peer_id, range));
    }

    fn remove_cursor(&mut self, peer_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.cursors.retain(|(id, _, _)| *id != peer_id);
        state.removed.push(peer_id);
    }
}
