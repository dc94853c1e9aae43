use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

use driftspace_core::{
    ColorAssigner, DocumentRef, FilePatch, FolderPatch, MutationTag, TreeStore, WorkspacePatch,
};

use crate::editor::{EditSource, EditorBridge};
use crate::persistence::Persistence;
use crate::presence::{PresencePeer, Roster};
use crate::relay::{CursorRange, RelayChannel, RelayFrame};

/// Hard ceiling on a serialized snapshot; larger documents are rejected
/// before any network call.
pub const MAX_SNAPSHOT_BYTES: usize = 1024 * 1024;

/// Inactivity window before the current snapshot is persisted
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(850);

/// Non-fatal, user-visible condition raised by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The serialized document exceeds [`MAX_SNAPSHOT_BYTES`]; nothing was
    /// sent and live relay is unaffected
    SnapshotTooLarge { bytes: usize },
    /// Persistence rejected the snapshot; local state was rolled back
    SaveFailed { message: String },
}

/// Input to a document session, from the editing widget and the relay
/// transport
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// The editing widget emitted a local change
    LocalEdit {
        delta: serde_json::Value,
        source: EditSource,
    },
    /// The local user moved their cursor
    LocalCursor { range: CursorRange },
    /// A frame arrived on the relay channel
    Incoming(RelayFrame),
    /// Close the session; equivalent to dropping the command sender
    Close,
}

/// Per-document realtime session.
///
/// Relays raw edit deltas with minimal latency, reconciles the presence
/// roster into remote cursor actors, and persists a debounced authoritative
/// snapshot with rollback on failure. Exactly one session (and one relay
/// channel) exists per open document; the whole session runs on one event
/// loop, so there is never more than one snapshot write in flight — edits
/// arriving during a write simply re-arm the debounce afterwards.
pub struct DocumentSession<P, R, E> {
    doc: DocumentRef,
    me: PresencePeer,
    tag: MutationTag,
    store: Arc<RwLock<TreeStore>>,
    persistence: P,
    channel: R,
    editor: E,
    colors: ColorAssigner,
    roster: Roster,
    notices: mpsc::UnboundedSender<Notice>,
    deadline: Option<Instant>,
}

impl<P, R, E> DocumentSession<P, R, E>
where
    P: Persistence,
    R: RelayChannel,
    E: EditorBridge,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        doc: DocumentRef,
        me: PresencePeer,
        tag: MutationTag,
        store: Arc<RwLock<TreeStore>>,
        persistence: P,
        channel: R,
        editor: E,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        Self {
            doc,
            me,
            tag,
            store,
            persistence,
            channel,
            editor,
            colors: ColorAssigner::new(),
            roster: Roster::new(),
            notices,
            deadline: None,
        }
    }

    /// Drives the session until `Close` arrives or the command sender is
    /// dropped. Teardown is deterministic: a pending debounce is discarded
    /// unfired and the relay channel is closed before returning.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        if let Err(err) = self.channel.broadcast(RelayFrame::Join {
            document_id: self.doc.id(),
            peer: self.me.clone(),
        }) {
            tracing::warn!(%err, "presence announcement failed");
        }

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(SessionCommand::Close) => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = tokio::time::sleep_until(self.deadline.unwrap_or_else(Instant::now)),
                    if self.deadline.is_some() =>
                {
                    self.deadline = None;
                    self.flush_snapshot().await;
                }
            }
        }

        self.channel.close();
        tracing::debug!(document = %self.doc.id(), "document session closed");
    }

    fn handle(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::LocalEdit { delta, source } => {
                // Remotely-applied edits must never feed back into the relay
                if source != EditSource::User {
                    return;
                }
                if let Err(err) = self.channel.broadcast(RelayFrame::Delta {
                    document_id: self.doc.id(),
                    delta,
                }) {
                    tracing::warn!(%err, "delta broadcast failed");
                }
                self.deadline = Some(Instant::now() + SAVE_DEBOUNCE);
            }
            SessionCommand::LocalCursor { range } => {
                if let Err(err) = self.channel.broadcast(RelayFrame::CursorMove {
                    document_id: self.doc.id(),
                    peer_id: self.me.id,
                    range,
                }) {
                    tracing::warn!(%err, "cursor broadcast failed");
                }
            }
            SessionCommand::Incoming(frame) => self.handle_frame(frame),
            // Close is consumed by the run loop before reaching here
            SessionCommand::Close => {}
        }
    }

    fn handle_frame(&mut self, frame: RelayFrame) {
        // frames for other documents are dropped, not queued
        if frame.document_id() != self.doc.id() {
            return;
        }
        match frame {
            RelayFrame::Delta { delta, .. } => self.editor.apply_remote(&delta),
            RelayFrame::CursorMove { peer_id, range, .. } => {
                if peer_id != self.me.id && self.roster.contains(peer_id) {
                    self.editor.move_cursor(peer_id, range);
                }
            }
            RelayFrame::RosterSync { peers, .. } => self.sync_roster(peers),
            // the hub answers joins with a roster sync
            RelayFrame::Join { .. } => {}
        }
    }

    fn sync_roster(&mut self, connections: Vec<PresencePeer>) {
        let diff = self.roster.sync(connections);
        for peer in diff.joined {
            if peer.id == self.me.id {
                continue;
            }
            let color = self.colors.color_for(peer.id);
            self.editor.create_cursor(peer.id, &peer.display_name, color);
        }
        for peer_id in diff.left {
            if peer_id == self.me.id {
                continue;
            }
            self.editor.remove_cursor(peer_id);
        }
    }

    /// Persists the full current snapshot: size-guard, optimistic store
    /// write, tagged persistence call, rollback on failure. Already-relayed
    /// deltas are never rolled back — peers have converged visually; only
    /// durability failed.
    async fn flush_snapshot(&mut self) {
        if self.editor.char_len() < 1 {
            return;
        }
        let snapshot = self.editor.contents();
        let serialized = match serde_json::to_string(&snapshot) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::warn!(%err, "snapshot serialization failed");
                return;
            }
        };
        if serialized.len() > MAX_SNAPSHOT_BYTES {
            self.notify(Notice::SnapshotTooLarge {
                bytes: serialized.len(),
            });
            return;
        }

        let previous_data = {
            let mut store = self.store.write().await;
            let Some(entity) = store.find(&self.doc) else {
                tracing::warn!(document = %self.doc.id(), "open document missing from store");
                return;
            };
            let previous_data = entity.data().map(str::to_owned);
            let result = match self.doc {
                DocumentRef::Workspace { id } => store.update_workspace(
                    id,
                    WorkspacePatch {
                        data: Some(Some(serialized.clone())),
                        ..Default::default()
                    },
                ),
                DocumentRef::Folder { id, .. } => store.update_folder(
                    id,
                    FolderPatch {
                        data: Some(Some(serialized.clone())),
                        ..Default::default()
                    },
                ),
                DocumentRef::File { id, .. } => store.update_file(
                    id,
                    FilePatch {
                        data: Some(Some(serialized.clone())),
                        ..Default::default()
                    },
                ),
            };
            if let Err(err) = result {
                tracing::warn!(%err, "optimistic snapshot write failed");
                return;
            }
            previous_data
        };

        let tag = self.tag.current();
        let result = match self.doc {
            DocumentRef::Workspace { id } => self
                .persistence
                .update_workspace(
                    id,
                    WorkspacePatch {
                        data: Some(Some(serialized)),
                        last_modified_by: Some(Some(tag)),
                        ..Default::default()
                    },
                )
                .await
                .map(drop),
            DocumentRef::Folder { id, .. } => self
                .persistence
                .update_folder(
                    id,
                    FolderPatch {
                        data: Some(Some(serialized)),
                        last_modified_by: Some(Some(tag)),
                        ..Default::default()
                    },
                )
                .await
                .map(drop),
            DocumentRef::File { id, .. } => self
                .persistence
                .update_file(
                    id,
                    FilePatch {
                        data: Some(Some(serialized)),
                        last_modified_by: Some(Some(tag)),
                        ..Default::default()
                    },
                )
                .await
                .map(drop),
        };

        if let Err(err) = result {
            let mut store = self.store.write().await;
            let rollback = match self.doc {
                DocumentRef::Workspace { id } => store.update_workspace(
                    id,
                    WorkspacePatch {
                        data: Some(previous_data),
                        ..Default::default()
                    },
                ),
                DocumentRef::Folder { id, .. } => store.update_folder(
                    id,
                    FolderPatch {
                        data: Some(previous_data),
                        ..Default::default()
                    },
                ),
                DocumentRef::File { id, .. } => store.update_file(
                    id,
                    FilePatch {
                        data: Some(previous_data),
                        ..Default::default()
                    },
                ),
            };
            if let Err(rollback_err) = rollback {
                tracing::error!(%rollback_err, "rollback after failed snapshot write");
            }
            self.notify(Notice::SaveFailed {
                message: err.to_string(),
            });
        }
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            tracing::debug!("notice receiver dropped");
        }
    }
}
