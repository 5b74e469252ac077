// ── Reactive snapshot store ──
//
// Holds the current aggregation output and broadcasts replacements via
// `watch` channels. A refresh commits exactly one snapshot send, so
// consumers never observe alerts from one fetch alongside facets from
// another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::AlertSnapshot;
use crate::stream::SnapshotStream;

/// Central reactive store for the portal's aggregation output.
pub struct AlertStore {
    snapshot: watch::Sender<Arc<AlertSnapshot>>,
    loading: watch::Sender<bool>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl AlertStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(AlertSnapshot::default()));
        let (loading, _) = watch::channel(false);
        let (last_refresh, _) = watch::channel(None);

        Self {
            snapshot,
            loading,
            last_refresh,
        }
    }

    /// Replace the whole snapshot atomically and stamp the refresh time.
    pub(crate) fn apply_snapshot(&self, snapshot: AlertSnapshot) {
        self.snapshot.send_replace(Arc::new(snapshot));
        let _ = self.last_refresh.send(Some(Utc::now()));
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<AlertSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    // ── Loading indicator ────────────────────────────────────────────

    pub(crate) fn set_loading(&self, loading: bool) {
        let _ = self.loading.send(loading);
    }

    /// Whether an aggregate fetch is currently in flight.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Observe the loading indicator.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last refresh committed, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
