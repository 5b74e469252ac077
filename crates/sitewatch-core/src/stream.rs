// ── Reactive snapshot stream ──
//
// Subscription type for consuming snapshot replacements from the
// AlertStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::AlertSnapshot;

/// A subscription to the portal's snapshot.
///
/// Provides both point-in-time access and reactive change notification via
/// [`changed`](Self::changed) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: Arc<AlertSnapshot>,
    receiver: watch::Receiver<Arc<AlertSnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<AlertSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at the last observation.
    pub fn current(&self) -> &Arc<AlertSnapshot> {
        &self.current
    }

    /// The latest snapshot (may have changed since the last observation).
    pub fn latest(&self) -> Arc<AlertSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next replacement, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<AlertSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new `Arc<AlertSnapshot>` each time a refresh commits.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<AlertSnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<AlertSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
