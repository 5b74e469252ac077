// ── Refresh poll controller ──
//
// One-shot timer driving the periodic refresh cycle. Two states: Idle (no
// pending refresh) and PendingRefresh (timer fired, refresh not yet
// dispatched). Re-arming cancels the previously armed timer, so there is
// never more than one timer outstanding.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Poll state observable by the refresh consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No pending refresh; a timer may be armed.
    Idle,
    /// The timer fired and the refresh has not been dispatched yet.
    PendingRefresh,
}

/// Timer-driven poll state machine.
///
/// Cheaply cloneable; clones share the same timer and state.
#[derive(Clone)]
pub struct PollController {
    inner: Arc<PollInner>,
}

struct PollInner {
    state: watch::Sender<PollState>,
    interval: Duration,
    armed: Mutex<Option<CancellationToken>>,
}

impl PollController {
    pub fn new(interval: Duration) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            inner: Arc::new(PollInner {
                state,
                interval,
                armed: Mutex::new(None),
            }),
        }
    }

    /// Arm the one-shot timer, cancelling any previously armed one, and
    /// return to Idle. On expiry the state transitions to PendingRefresh.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let token = CancellationToken::new();
        let previous = {
            let mut armed = self.inner.armed.lock().unwrap_or_else(|e| e.into_inner());
            armed.replace(token.clone())
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        let _ = self.inner.state.send(PollState::Idle);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(inner.interval) => {
                    let _ = inner.state.send(PollState::PendingRefresh);
                }
            }
        });
    }

    /// Disarm the timer without consuming a pending transition.
    pub fn cancel(&self) {
        let armed = {
            let mut guard = self.inner.armed.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(token) = armed {
            token.cancel();
        }
    }

    /// Atomically consume a pending transition. Returns `true` when the
    /// state was PendingRefresh (now reset to Idle).
    pub fn consume_pending(&self) -> bool {
        self.inner.state.send_replace(PollState::Idle) == PollState::PendingRefresh
    }

    /// The current state.
    pub fn state(&self) -> PollState {
        *self.inner.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }
}
