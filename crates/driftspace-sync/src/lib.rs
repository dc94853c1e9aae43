pub mod catalog;
pub mod document;
pub mod editor;
pub mod engine;
pub mod feed;
pub mod persistence;
pub mod presence;
pub mod reconciler;
pub mod relay;

#[cfg(test)]
mod testutil;

pub use catalog::{Catalog, CatalogError};
pub use document::{
    DocumentSession, Notice, SessionCommand, MAX_SNAPSHOT_BYTES, SAVE_DEBOUNCE,
};
pub use editor::{EditSource, EditorBridge};
pub use engine::{SyncEngine, SyncSignal};
pub use feed::{ChangeEvent, ChangeKind, Membership};
pub use persistence::{PersistError, Persistence};
pub use presence::{PresencePeer, Roster, RosterDiff};
pub use reconciler::{Outcome, Reconciler};
pub use relay::{CursorRange, RelayChannel, RelayError, RelayFrame};
