use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::presence::PresencePeer;

/// Cursor selection in the editing widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRange {
    pub index: u32,
    pub length: u32,
}

/// Frames exchanged on a document's ephemeral relay channel.
///
/// Best-effort delivery to currently subscribed peers only; nothing is
/// persisted or replayed. Deltas are opaque editor output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RelayFrame {
    /// Announce presence on a document's channel
    Join {
        document_id: Uuid,
        peer: PresencePeer,
    },
    /// Raw edit operations, broadcast verbatim for visual convergence
    Delta {
        document_id: Uuid,
        delta: serde_json::Value,
    },
    /// A peer moved their cursor
    CursorMove {
        document_id: Uuid,
        peer_id: Uuid,
        range: CursorRange,
    },
    /// Full per-connection roster of the channel; clients dedup by peer id
    RosterSync {
        document_id: Uuid,
        peers: Vec<PresencePeer>,
    },
}

impl RelayFrame {
    pub fn document_id(&self) -> Uuid {
        match self {
            RelayFrame::Join { document_id, .. }
            | RelayFrame::Delta { document_id, .. }
            | RelayFrame::CursorMove { document_id, .. }
            | RelayFrame::RosterSync { document_id, .. } => *document_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay channel closed")]
    Closed,

    #[error("relay transport failure: {0}")]
    Transport(String),
}

/// Outbound half of a per-document relay channel.
///
/// Inbound frames are delivered by the transport adapter as session
/// commands. `close` must tear the subscription down synchronously; a
/// leaked channel is a defect.
pub trait RelayChannel {
    fn broadcast(&self, frame: RelayFrame) -> Result<(), RelayError>;
    fn close(&self);
}
