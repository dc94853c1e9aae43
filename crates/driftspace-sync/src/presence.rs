use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Presence record a client tracks on its open document's channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePeer {
    pub id: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub avatar_ref: Option<String>,
    /// Opaque freshness marker; never used for roster diffing
    #[serde(default)]
    pub version: u64,
}

/// Peers that appeared and disappeared between two roster syncs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterDiff {
    pub joined: Vec<PresencePeer>,
    pub left: Vec<Uuid>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// Visible collaborators on the open document.
///
/// A roster sync carries one record per connection, so the same peer can
/// appear more than once; records are deduplicated by id (last one wins)
/// and the result is diffed against the previous roster by id only, to
/// avoid churn when a peer's record content changes.
#[derive(Debug, Default)]
pub struct Roster {
    peers: Vec<PresencePeer>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peers(&self) -> &[PresencePeer] {
        &self.peers
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.peers.iter().any(|p| p.id == id)
    }

    /// Folds the per-connection records of a roster sync into the roster
    pub fn sync(&mut self, connections: Vec<PresencePeer>) -> RosterDiff {
        let mut deduped: Vec<PresencePeer> = Vec::with_capacity(connections.len());
        for peer in connections {
            if let Some(existing) = deduped.iter_mut().find(|p| p.id == peer.id) {
                *existing = peer;
            } else {
                deduped.push(peer);
            }
        }

        let same_ids = deduped.len() == self.peers.len()
            && deduped.iter().zip(&self.peers).all(|(a, b)| a.id == b.id);
        if same_ids {
            return RosterDiff::default();
        }

        let joined = deduped
            .iter()
            .filter(|p| !self.contains(p.id))
            .cloned()
            .collect();
        let left = self
            .peers
            .iter()
            .filter(|p| !deduped.iter().any(|d| d.id == p.id))
            .map(|p| p.id)
            .collect();

        self.peers = deduped;
        RosterDiff { joined, left }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: Uuid, name: &str) -> PresencePeer {
        PresencePeer {
            id,
            display_name: name.into(),
            avatar_ref: None,
            version: 0,
        }
    }

    #[test]
    fn test_duplicate_connections_resolve_to_one_collaborator() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();

        // the same peer from two connections, e.g. two browser tabs
        let diff = roster.sync(vec![peer(id, "ada"), peer(id, "ada")]);

        assert_eq!(roster.peers().len(), 1);
        assert_eq!(diff.joined.len(), 1);
        assert!(diff.left.is_empty());
    }

    #[test]
    fn test_dedup_keeps_last_record_for_an_id() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();
        let mut newer = peer(id, "ada");
        newer.version = 7;

        roster.sync(vec![peer(id, "ada"), newer.clone()]);

        assert_eq!(roster.peers(), &[newer]);
    }

    #[test]
    fn test_diff_is_by_id_only() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();
        roster.sync(vec![peer(id, "ada")]);

        // same id, different record content: no churn
        let mut renamed = peer(id, "ada lovelace");
        renamed.version = 3;
        let diff = roster.sync(vec![renamed]);

        assert!(diff.is_empty());
        // and the previous record is kept untouched
        assert_eq!(roster.peers()[0].display_name, "ada");
    }

    #[test]
    fn test_join_and_leave_are_reported() {
        let mut roster = Roster::new();
        let ada = Uuid::new_v4();
        let grace = Uuid::new_v4();
        roster.sync(vec![peer(ada, "ada")]);

        let diff = roster.sync(vec![peer(grace, "grace")]);

        assert_eq!(diff.joined.len(), 1);
        assert_eq!(diff.joined[0].id, grace);
        assert_eq!(diff.left, vec![ada]);
        assert_eq!(roster.peers().len(), 1);
    }

    #[test]
    fn test_empty_sync_clears_roster() {
        let mut roster = Roster::new();
        let ada = Uuid::new_v4();
        roster.sync(vec![peer(ada, "ada")]);

        let diff = roster.sync(Vec::new());

        assert_eq!(diff.left, vec![ada]);
        assert!(roster.peers().is_empty());
    }
}
