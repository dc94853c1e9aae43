use std::sync::Arc;

use tokio::sync::{mpsc, watch, RwLock};

use driftspace_core::{DocumentRef, Location, TreeStore};

use crate::feed::ChangeEvent;
use crate::reconciler::{Outcome, Reconciler};

/// Structural change the embedder must act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    /// Workspace visibility changed: refetch the catalog
    Refresh,
    /// The open document disappeared remotely
    Navigate(Location),
}

/// Run-loop folding the change feed into the shared Tree Store.
///
/// The transport owns the subscription (and resubscription after a drop);
/// this engine just resumes folding whatever arrives. Field-level merges are
/// absorbed silently; structural outcomes are forwarded as [`SyncSignal`]s.
pub struct SyncEngine {
    store: Arc<RwLock<TreeStore>>,
    reconciler: Reconciler,
    open: watch::Receiver<Option<DocumentRef>>,
    signals: mpsc::UnboundedSender<SyncSignal>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<RwLock<TreeStore>>,
        reconciler: Reconciler,
        open: watch::Receiver<Option<DocumentRef>>,
        signals: mpsc::UnboundedSender<SyncSignal>,
    ) -> Self {
        Self {
            store,
            reconciler,
            open,
            signals,
        }
    }

    /// Consumes feed events until the transport closes the channel
    pub async fn run(self, mut feed: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = feed.recv().await {
            let open = *self.open.borrow();
            let outcome = {
                let mut store = self.store.write().await;
                self.reconciler.apply(&mut store, open.as_ref(), event)
            };
            match outcome {
                Outcome::Refresh => {
                    let _ = self.signals.send(SyncSignal::Refresh);
                }
                Outcome::Navigate(location) => {
                    let _ = self.signals.send(SyncSignal::Navigate(location));
                }
                outcome => tracing::trace!(?outcome, "change event folded"),
            }
        }
        tracing::debug!("change feed closed");
    }
}
