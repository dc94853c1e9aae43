use std::sync::{Arc, RwLock};

use uuid::Uuid;

/// Session-scoped origin tag attached to every outgoing write as
/// `last_modified_by`.
///
/// One value is generated when the session starts (login) and stays stable
/// until [`MutationTag::regenerate`] is called (logout). Clones share the
/// same value, so the tag can be handed to each component that writes. The
/// reconciler uses it to recognize and discard a client's own echoed writes;
/// it carries no authorization semantics.
#[derive(Debug, Clone)]
pub struct MutationTag {
    inner: Arc<RwLock<Uuid>>,
}

impl MutationTag {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Uuid::new_v4())),
        }
    }

    /// The tag for the current session
    pub fn current(&self) -> Uuid {
        *self.inner.read().expect("mutation tag lock poisoned")
    }

    /// Replaces the tag with a fresh value, e.g. on logout
    pub fn regenerate(&self) -> Uuid {
        let fresh = Uuid::new_v4();
        *self.inner.write().expect("mutation tag lock poisoned") = fresh;
        fresh
    }
}

impl Default for MutationTag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_across_clones() {
        let tag = MutationTag::new();
        let clone = tag.clone();
        assert_eq!(tag.current(), clone.current());
    }

    #[test]
    fn test_regenerate_changes_all_handles() {
        let tag = MutationTag::new();
        let clone = tag.clone();
        let before = tag.current();

        let fresh = clone.regenerate();

        assert_ne!(before, fresh);
        assert_eq!(tag.current(), fresh);
    }
}
