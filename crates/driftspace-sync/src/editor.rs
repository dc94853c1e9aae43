use uuid::Uuid;

use driftspace_core::PeerColor;

use crate::relay::CursorRange;

/// Where an edit event originated in the editing widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    /// Typed or otherwise produced by the local user
    User,
    /// Applied programmatically, e.g. a relayed remote delta
    Api,
}

/// Seam to the text-editing widget.
///
/// The widget owns operational-transform internals; the engine only relays
/// its opaque delta output and drives remote cursor actors.
pub trait EditorBridge {
    /// Applies a relayed remote delta on top of the current contents
    fn apply_remote(&mut self, delta: &serde_json::Value);

    /// Replaces the whole document state
    fn set_contents(&mut self, snapshot: &serde_json::Value);

    /// Full current document snapshot
    fn contents(&self) -> serde_json::Value;

    /// Character length of the current contents
    fn char_len(&self) -> usize;

    fn create_cursor(&mut self, peer_id: Uuid, label: &str, color: PeerColor);
    fn move_cursor(&mut self, peer_id: Uuid, range: CursorRange);
    fn remove_cursor(&mut self, peer_id: Uuid);
}
