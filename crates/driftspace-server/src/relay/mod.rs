pub mod ws;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use driftspace_sync::{PresencePeer, RelayFrame};

/// Frame traveling through a room, tagged with the connection that sent it
/// so the fan-out can skip the sender. Origin `0` is the hub itself.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: u64,
    pub frame: RelayFrame,
}

const HUB_ORIGIN: u64 = 0;

/// Ephemeral per-document broadcast group.
///
/// Holds one presence record per connection — the same user on two
/// connections appears twice, and clients deduplicate by peer id. Nothing
/// is persisted or replayed; a frame reaches only currently subscribed
/// connections.
pub struct Room {
    document_id: Uuid,
    frames: broadcast::Sender<Envelope>,
    presence: Mutex<HashMap<u64, PresencePeer>>,
}

impl Room {
    fn new(document_id: Uuid) -> Self {
        let (frames, _) = broadcast::channel(256);
        Self {
            document_id,
            frames,
            presence: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.frames.subscribe()
    }

    /// Fan a frame out to every subscriber; receivers drop their own origin
    pub fn relay(&self, origin: u64, frame: RelayFrame) {
        // ignore errors if no receivers
        let _ = self.frames.send(Envelope { origin, frame });
    }

    /// Track a connection's presence and announce the new roster
    pub async fn join(&self, connection: u64, peer: PresencePeer) {
        self.presence.lock().await.insert(connection, peer);
        self.broadcast_roster().await;
    }

    /// Drop a connection's presence and announce the new roster
    pub async fn leave(&self, connection: u64) {
        self.presence.lock().await.remove(&connection);
        self.broadcast_roster().await;
    }

    pub async fn occupancy(&self) -> usize {
        self.presence.lock().await.len()
    }

    async fn broadcast_roster(&self) {
        let peers: Vec<PresencePeer> = self.presence.lock().await.values().cloned().collect();
        self.relay(
            HUB_ORIGIN,
            RelayFrame::RosterSync {
                document_id: self.document_id,
                peers,
            },
        );
    }
}

/// Store for the per-document relay rooms
pub struct RoomRegistry {
    rooms: RwLock<HashMap<Uuid, Arc<Room>>>,
    next_connection: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Fresh id for a relay connection; never reuses `0` (the hub origin)
    pub fn next_connection_id(&self) -> u64 {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Get or create the room for a document
    pub async fn get_or_create(&self, document_id: Uuid) -> Arc<Room> {
        {
            let rooms = self.rooms.read().await;
            if let Some(room) = rooms.get(&document_id) {
                return Arc::clone(room);
            }
        }

        let mut rooms = self.rooms.write().await;
        // double-check after acquiring the write lock
        if let Some(room) = rooms.get(&document_id) {
            return Arc::clone(room);
        }

        let room = Arc::new(Room::new(document_id));
        rooms.insert(document_id, Arc::clone(&room));
        room
    }

    /// Drop a room once nobody is present or subscribed
    pub async fn remove_if_idle(&self, document_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(&document_id) {
            if room.occupancy().await == 0 && room.frames.receiver_count() == 0 {
                rooms.remove(&document_id);
            }
        }
    }

    pub async fn count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
