use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tradewatch_core::Snapshot;

/// What the store publishes: the latest snapshot and when it arrived.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFrame {
    pub snapshot: Arc<Snapshot>,
    /// `None` until the first message has been accepted.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Single source of truth for the latest snapshot.
///
/// `replace` is the only mutation and always overwrites the whole snapshot.
/// Readers either call [`SnapshotStore::current`] or subscribe to be woken on
/// every replacement.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<SnapshotFrame>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SnapshotFrame::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn replace(&self, snapshot: Snapshot) {
        self.tx.send_replace(SnapshotFrame {
            snapshot: Arc::new(snapshot),
            updated_at: Some(Utc::now()),
        });
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().snapshot.clone()
    }

    pub fn frame(&self) -> SnapshotFrame {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SnapshotFrame> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
