use uuid::Uuid;

use driftspace_core::{DocumentRef, Location, MutationTag, TreeStore};

use crate::feed::{ChangeEvent, ChangeKind, Membership};

/// What the reconciler did with one change-feed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Folded into the store
    Applied,
    /// Confirmation of this client's own write, discarded
    SelfEcho,
    /// Update older than the stored row, discarded by LWW
    Stale,
    /// Not applicable (unknown id, duplicate insert, malformed payload)
    Ignored,
    /// Membership changed for the current user: refetch the catalog
    Refresh,
    /// The open document disappeared: go to its nearest surviving ancestor
    Navigate(Location),
}

/// Folds change-feed notifications into the Tree Store.
///
/// Each event is self-contained and each merge is a commutative, id-keyed
/// field overwrite, so no delivery order is assumed across tables or within
/// one. The reconciler holds no retry state; resubscription after a
/// transport drop is the transport's responsibility.
#[derive(Debug, Clone)]
pub struct Reconciler {
    tag: MutationTag,
    user_id: Uuid,
}

impl Reconciler {
    pub fn new(tag: MutationTag, user_id: Uuid) -> Self {
        Self { tag, user_id }
    }

    /// Applies one event. `open` is the document currently shown, if any;
    /// it decides whether a remote delete triggers navigation.
    pub fn apply(
        &self,
        store: &mut TreeStore,
        open: Option<&DocumentRef>,
        event: ChangeEvent,
    ) -> Outcome {
        // A client's own echoed write carries its tag; deletes are exempt
        // because the old row's tag names whoever wrote last, not the deleter.
        if !matches!(event, ChangeEvent::Collaborators { .. })
            && event.kind() != ChangeKind::Delete
            && event.actor() == Some(self.tag.current())
        {
            return Outcome::SelfEcho;
        }

        match event {
            ChangeEvent::Workspaces { kind, new, old } => match kind {
                ChangeKind::Insert => {
                    let Some(row) = new else {
                        return self.drop_malformed("workspaces insert without new row");
                    };
                    if store.workspace(row.id).is_some() {
                        return Outcome::Ignored;
                    }
                    match store.add_workspace(row) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Update => {
                    let Some(row) = new else {
                        return self.drop_malformed("workspaces update without new row");
                    };
                    let Some(current) = store.workspace(row.id) else {
                        return Outcome::Ignored;
                    };
                    if row.updated_at < current.updated_at {
                        return Outcome::Stale;
                    }
                    let patch = row.as_patch();
                    match store.update_workspace(row.id, patch) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Delete => {
                    let Some(row) = old else {
                        return self.drop_malformed("workspaces delete without old row");
                    };
                    if store.delete_workspace(row.id).is_err() {
                        return Outcome::Ignored;
                    }
                    match open {
                        Some(doc) if doc.workspace_id() == row.id => {
                            Outcome::Navigate(Location::Dashboard)
                        }
                        _ => Outcome::Applied,
                    }
                }
            },
            ChangeEvent::Folders { kind, new, old } => match kind {
                ChangeKind::Insert => {
                    let Some(row) = new else {
                        return self.drop_malformed("folders insert without new row");
                    };
                    if store.folder(row.id).is_some() {
                        return Outcome::Ignored;
                    }
                    match store.add_folder(row) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Update => {
                    let Some(row) = new else {
                        return self.drop_malformed("folders update without new row");
                    };
                    let Some(current) = store.folder(row.id) else {
                        return Outcome::Ignored;
                    };
                    if row.updated_at < current.updated_at {
                        return Outcome::Stale;
                    }
                    let patch = row.as_patch();
                    match store.update_folder(row.id, patch) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Delete => {
                    let Some(row) = old else {
                        return self.drop_malformed("folders delete without old row");
                    };
                    if store.delete_folder(row.id).is_err() {
                        return Outcome::Ignored;
                    }
                    match open {
                        Some(DocumentRef::Folder { id, workspace_id }) if *id == row.id => {
                            Outcome::Navigate(Location::Workspace { id: *workspace_id })
                        }
                        // the open file's folder is gone, so land on the workspace
                        Some(DocumentRef::File {
                            folder_id,
                            workspace_id,
                            ..
                        }) if *folder_id == row.id => {
                            Outcome::Navigate(Location::Workspace { id: *workspace_id })
                        }
                        _ => Outcome::Applied,
                    }
                }
            },
            ChangeEvent::Files { kind, new, old } => match kind {
                ChangeKind::Insert => {
                    let Some(row) = new else {
                        return self.drop_malformed("files insert without new row");
                    };
                    if store.file(row.id).is_some() {
                        return Outcome::Ignored;
                    }
                    match store.add_file(row) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Update => {
                    let Some(row) = new else {
                        return self.drop_malformed("files update without new row");
                    };
                    let Some(current) = store.file(row.id) else {
                        return Outcome::Ignored;
                    };
                    if row.updated_at < current.updated_at {
                        return Outcome::Stale;
                    }
                    let patch = row.as_patch();
                    match store.update_file(row.id, patch) {
                        Ok(()) => Outcome::Applied,
                        Err(err) => self.drop_malformed(&err.to_string()),
                    }
                }
                ChangeKind::Delete => {
                    let Some(row) = old else {
                        return self.drop_malformed("files delete without old row");
                    };
                    if store.delete_file(row.id).is_err() {
                        return Outcome::Ignored;
                    }
                    match open {
                        Some(doc @ DocumentRef::File { id, .. }) if *id == row.id => {
                            Outcome::Navigate(doc.ancestor())
                        }
                        _ => Outcome::Applied,
                    }
                }
            },
            ChangeEvent::Collaborators { kind, new, old } => {
                self.apply_membership(store, kind, new, old)
            }
        }
    }

    /// Membership changes for the current user alter which workspaces are
    /// visible at all, so they trigger a structural refetch instead of an
    /// incremental merge.
    fn apply_membership(
        &self,
        store: &TreeStore,
        kind: ChangeKind,
        new: Option<Membership>,
        old: Option<Membership>,
    ) -> Outcome {
        let row = match kind {
            ChangeKind::Delete => old,
            _ => new,
        };
        let Some(row) = row else {
            return self.drop_malformed("collaborators event without row");
        };
        if row.user_id != self.user_id {
            return Outcome::Ignored;
        }
        match kind {
            ChangeKind::Insert if store.workspace(row.workspace_id).is_none() => Outcome::Refresh,
            ChangeKind::Delete if store.workspace(row.workspace_id).is_some() => Outcome::Refresh,
            _ => Outcome::Ignored,
        }
    }

    fn drop_malformed(&self, reason: &str) -> Outcome {
        tracing::debug!(reason, "dropping change event");
        Outcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use driftspace_core::{File, Folder, Workspace};

    fn setup() -> (TreeStore, Reconciler, Workspace, Folder, File) {
        let mut store = TreeStore::new();
        let workspace = Workspace::new("Product", "🚀", Uuid::new_v4());
        let folder = Folder::new(workspace.id, "Specs", "🗂");
        let file = File::new(workspace.id, folder.id, "Notes", "📄");
        store.add_workspace(workspace.clone()).unwrap();
        store.add_folder(folder.clone()).unwrap();
        store.add_file(file.clone()).unwrap();
        let reconciler = Reconciler::new(MutationTag::new(), Uuid::new_v4());
        (store, reconciler, workspace, folder, file)
    }

    fn file_update(file: &File) -> ChangeEvent {
        ChangeEvent::Files {
            kind: ChangeKind::Update,
            new: Some(file.clone()),
            old: None,
        }
    }

    #[test]
    fn test_insert_is_idempotent_against_duplicate_delivery() {
        let (mut store, reconciler, workspace, folder, _) = setup();
        let fresh = File::new(workspace.id, folder.id, "Fresh", "✨");
        let event = ChangeEvent::Files {
            kind: ChangeKind::Insert,
            new: Some(fresh.clone()),
            old: None,
        };

        assert_eq!(
            reconciler.apply(&mut store, None, event.clone()),
            Outcome::Applied
        );
        let after_first = store.file(fresh.id).cloned();

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Ignored);
        assert_eq!(store.file(fresh.id).cloned(), after_first);
        assert_eq!(store.file_count(), 2);
    }

    #[test]
    fn test_self_echo_never_mutates_the_store() {
        let (mut store, reconciler, _, _, file) = setup();
        let mut echoed = file.clone();
        echoed.title = "Echoed".into();
        echoed.updated_at = Utc::now() + Duration::seconds(5);
        echoed.last_modified_by = Some(reconciler.tag.current());

        let outcome = reconciler.apply(&mut store, None, file_update(&echoed));

        assert_eq!(outcome, Outcome::SelfEcho);
        assert_eq!(store.file(file.id).unwrap().title, "Notes");
    }

    #[test]
    fn test_delete_is_applied_even_when_old_row_carries_own_tag() {
        let (mut store, reconciler, _, _, file) = setup();
        let mut old = file.clone();
        old.last_modified_by = Some(reconciler.tag.current());

        let outcome = reconciler.apply(
            &mut store,
            None,
            ChangeEvent::Files {
                kind: ChangeKind::Delete,
                new: None,
                old: Some(old),
            },
        );

        assert_eq!(outcome, Outcome::Applied);
        assert!(store.file(file.id).is_none());
    }

    #[test]
    fn test_lww_later_timestamp_wins_regardless_of_arrival_order() {
        let (mut store, reconciler, _, _, file) = setup();

        let mut late = file.clone();
        late.title = "Later".into();
        late.updated_at = file.updated_at + Duration::seconds(10);
        let mut early = file.clone();
        early.title = "Earlier".into();
        early.updated_at = file.updated_at + Duration::seconds(5);

        // late arrives first, early second: early must lose
        assert_eq!(
            reconciler.apply(&mut store, None, file_update(&late)),
            Outcome::Applied
        );
        assert_eq!(
            reconciler.apply(&mut store, None, file_update(&early)),
            Outcome::Stale
        );
        assert_eq!(store.file(file.id).unwrap().title, "Later");

        // and in delivery order the later one still ends up winning
        let (mut store, reconciler, _, _, file) = setup();
        let mut early = file.clone();
        early.title = "Earlier".into();
        early.updated_at = file.updated_at + Duration::seconds(5);
        let mut late = file.clone();
        late.title = "Later".into();
        late.updated_at = file.updated_at + Duration::seconds(10);
        reconciler.apply(&mut store, None, file_update(&early));
        reconciler.apply(&mut store, None, file_update(&late));
        assert_eq!(store.file(file.id).unwrap().title, "Later");
    }

    #[test]
    fn test_update_for_unknown_id_is_ignored_then_insert_succeeds() {
        let (mut store, reconciler, workspace, folder, _) = setup();
        let unseen = File::new(workspace.id, folder.id, "Unseen", "👻");

        assert_eq!(
            reconciler.apply(&mut store, None, file_update(&unseen)),
            Outcome::Ignored
        );
        assert!(store.file(unseen.id).is_none());

        let insert = ChangeEvent::Files {
            kind: ChangeKind::Insert,
            new: Some(unseen.clone()),
            old: None,
        };
        assert_eq!(reconciler.apply(&mut store, None, insert), Outcome::Applied);
        assert!(store.file(unseen.id).is_some());
    }

    #[test]
    fn test_update_merges_fields_in_place() {
        let (mut store, reconciler, _, _, file) = setup();
        let mut remote = file.clone();
        remote.title = "Merged".into();
        remote.in_trash = Some("cleanup".into());
        remote.updated_at = file.updated_at + Duration::seconds(1);

        reconciler.apply(&mut store, None, file_update(&remote));

        let stored = store.file(file.id).unwrap();
        assert_eq!(stored.title, "Merged");
        assert_eq!(stored.in_trash.as_deref(), Some("cleanup"));
        assert_eq!(stored.created_at, file.created_at);
    }

    #[test]
    fn test_delete_of_open_file_navigates_to_its_folder() {
        let (mut store, reconciler, workspace, folder, file) = setup();
        let open = DocumentRef::File {
            workspace_id: workspace.id,
            folder_id: folder.id,
            id: file.id,
        };

        let outcome = reconciler.apply(
            &mut store,
            Some(&open),
            ChangeEvent::Files {
                kind: ChangeKind::Delete,
                new: None,
                old: Some(file.clone()),
            },
        );

        assert_eq!(
            outcome,
            Outcome::Navigate(Location::Folder {
                workspace_id: workspace.id,
                id: folder.id
            })
        );
        assert!(store.file(file.id).is_none());
    }

    #[test]
    fn test_delete_of_open_folder_navigates_to_workspace() {
        let (mut store, reconciler, workspace, folder, _) = setup();
        let open = DocumentRef::Folder {
            workspace_id: workspace.id,
            id: folder.id,
        };

        let outcome = reconciler.apply(
            &mut store,
            Some(&open),
            ChangeEvent::Folders {
                kind: ChangeKind::Delete,
                new: None,
                old: Some(folder.clone()),
            },
        );

        assert_eq!(outcome, Outcome::Navigate(Location::Workspace { id: workspace.id }));
        // the folder's files are gone with it
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn test_delete_of_workspace_while_inside_navigates_to_dashboard() {
        let (mut store, reconciler, workspace, folder, file) = setup();
        let open = DocumentRef::File {
            workspace_id: workspace.id,
            folder_id: folder.id,
            id: file.id,
        };

        let outcome = reconciler.apply(
            &mut store,
            Some(&open),
            ChangeEvent::Workspaces {
                kind: ChangeKind::Delete,
                new: None,
                old: Some(workspace.clone()),
            },
        );

        assert_eq!(outcome, Outcome::Navigate(Location::Dashboard));
        assert_eq!(store.workspace_count(), 0);
        assert_eq!(store.folder_count(), 0);
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn test_delete_of_unrelated_entity_does_not_navigate() {
        let (mut store, reconciler, workspace, folder, _) = setup();
        let other = File::new(workspace.id, folder.id, "Other", "📄");
        store.add_file(other.clone()).unwrap();
        let open = DocumentRef::Workspace { id: workspace.id };

        let outcome = reconciler.apply(
            &mut store,
            Some(&open),
            ChangeEvent::Files {
                kind: ChangeKind::Delete,
                new: None,
                old: Some(other),
            },
        );

        assert_eq!(outcome, Outcome::Applied);
    }

    #[test]
    fn test_membership_insert_for_current_user_triggers_refresh() {
        let (mut store, reconciler, ..) = setup();
        let event = ChangeEvent::Collaborators {
            kind: ChangeKind::Insert,
            new: Some(Membership {
                id: Uuid::new_v4(),
                workspace_id: Uuid::new_v4(),
                user_id: reconciler.user_id,
                created_at: Utc::now(),
            }),
            old: None,
        };

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Refresh);
    }

    #[test]
    fn test_membership_delete_for_current_user_triggers_refresh() {
        let (mut store, reconciler, workspace, _, _) = setup();
        let event = ChangeEvent::Collaborators {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(Membership {
                id: Uuid::new_v4(),
                workspace_id: workspace.id,
                user_id: reconciler.user_id,
                created_at: Utc::now(),
            }),
        };

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Refresh);
    }

    #[test]
    fn test_membership_event_for_other_user_is_ignored() {
        let (mut store, reconciler, workspace, _, _) = setup();
        let event = ChangeEvent::Collaborators {
            kind: ChangeKind::Insert,
            new: Some(Membership {
                id: Uuid::new_v4(),
                workspace_id: workspace.id,
                user_id: Uuid::new_v4(),
                created_at: Utc::now(),
            }),
            old: None,
        };

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Ignored);
    }

    #[test]
    fn test_malformed_event_is_dropped_not_fatal() {
        let (mut store, reconciler, ..) = setup();
        let event = ChangeEvent::Files {
            kind: ChangeKind::Insert,
            new: None,
            old: None,
        };

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Ignored);
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn test_insert_under_unknown_parent_is_dropped() {
        let (mut store, reconciler, ..) = setup();
        let stray = Folder::new(Uuid::new_v4(), "Stray", "🗂");
        let event = ChangeEvent::Folders {
            kind: ChangeKind::Insert,
            new: Some(stray.clone()),
            old: None,
        };

        assert_eq!(reconciler.apply(&mut store, None, event), Outcome::Ignored);
        assert!(store.folder(stray.id).is_none());
    }
}
