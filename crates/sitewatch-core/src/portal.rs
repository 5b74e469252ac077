// ── Portal orchestration ──
//
// Full lifecycle management for one portal instance: site reference
// loading, aggregate refresh, poll consumption, and view-state gating.
// Rendering shells observe the AlertStore and call back in for filters,
// history, comments, and tickets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sitewatch_api::StoreClient;
use sitewatch_api::rest::models::{AlarmRecord, NodeDownRecord};
use sitewatch_api::transport::{TlsMode, TransportConfig};

use crate::aggregate::build_snapshot;
use crate::cache::{SiteCache, SiteIndex, build_site_index, parse_site_reference};
use crate::config::{PortalConfig, TlsVerification};
use crate::error::{CoreError, SnapshotSource};
use crate::filter::{FilterSet, apply_filters};
use crate::model::Alert;
use crate::poll::{PollController, PollState};
use crate::store::AlertStore;

// ── ActiveView ───────────────────────────────────────────────────

/// Which view the host shell is currently presenting.
///
/// A poll tick that fires while a detail view is open is deferred, not
/// dropped: the pending refresh is consumed when the shell returns to the
/// aggregate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// The aggregate table/map/chart view.
    Portal,
    /// A per-alert detail view.
    Detail,
}

// ── Portal ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<PortalInner>`. Manages the site reference
/// cache, the aggregate refresh cycle, and the poll state machine.
#[derive(Clone)]
pub struct Portal {
    inner: Arc<PortalInner>,
}

struct PortalInner {
    config: PortalConfig,
    client: StoreClient,
    store: AlertStore,
    site_cache: Arc<SiteCache>,
    poll: PollController,
    view: watch::Sender<ActiveView>,
    /// Single-flight guard: a poll tick arriving mid-refresh is skipped.
    refresh_lock: Mutex<()>,
    initialized: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Portal {
    /// Create a new Portal from configuration with a fresh session cache.
    /// Does NOT load anything -- call [`init()`](Self::init).
    pub fn new(config: PortalConfig) -> Result<Self, CoreError> {
        Self::with_cache(config, Arc::new(SiteCache::new()))
    }

    /// Create a Portal sharing an externally owned site cache.
    ///
    /// The cache is an injected dependency so hosts can scope it to their
    /// session and tests can seed or clear it deterministically.
    pub fn with_cache(config: PortalConfig, site_cache: Arc<SiteCache>) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = StoreClient::new(config.base_url.clone(), &transport)?;
        let poll = PollController::new(Duration::from_secs(config.refresh_interval_secs.max(1)));
        let (view, _) = watch::channel(ActiveView::Portal);

        Ok(Self {
            inner: Arc::new(PortalInner {
                config,
                client,
                store: AlertStore::new(),
                site_cache,
                poll,
                view,
                refresh_lock: Mutex::new(()),
                initialized: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the portal configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Access the underlying AlertStore.
    pub fn store(&self) -> &AlertStore {
        &self.inner.store
    }

    /// The gateway client (history/comment/ticket flows reuse it).
    pub(crate) fn client(&self) -> &StoreClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Initialize the portal.
    ///
    /// Loads the site reference (unless the session cache already holds
    /// it), performs the initial aggregate refresh, and starts the poll
    /// cycle when a refresh interval is configured.
    pub async fn init(&self) -> Result<(), CoreError> {
        self.ensure_site_index().await?;
        self.refresh().await?;
        self.inner.initialized.store(true, Ordering::Release);

        if self.inner.config.refresh_interval_secs > 0 {
            let portal = self.clone();
            let cancel = self.inner.cancel.clone();
            let mut handles = self.inner.task_handles.lock().await;
            handles.push(tokio::spawn(poll_task(portal, cancel)));
        }

        info!("portal initialized");
        Ok(())
    }

    /// Shut down background tasks and disarm the poll timer.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.poll.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("portal shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch both snapshot files and replace the aggregate state.
    ///
    /// Serialized behind a single-flight guard: a call arriving while a
    /// refresh is in flight returns immediately without fetching. On any
    /// fetch or parse failure the previously committed snapshot stays.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let Ok(_guard) = self.inner.refresh_lock.try_lock() else {
            debug!("refresh already in flight; skipping");
            return Ok(());
        };

        self.inner.store.set_loading(true);
        let result = self.load_alerts().await;
        self.inner.store.set_loading(false);
        result
    }

    /// The fetch-normalize-commit pipeline behind [`refresh`](Self::refresh).
    async fn load_alerts(&self) -> Result<(), CoreError> {
        let sites = self.ensure_site_index().await?;
        let config = &self.inner.config;
        let client = &self.inner.client;

        // The two snapshot fetches are independent; issue them together.
        let (alarm_file, node_file) = tokio::join!(
            client.latest_file(&config.folders.alarms),
            client.latest_file(&config.folders.node_down),
        );
        let alarm_file = alarm_file?.ok_or(CoreError::SourceNotFound {
            source: SnapshotSource::Alarms,
        })?;
        let node_file = node_file?.ok_or(CoreError::SourceNotFound {
            source: SnapshotSource::NodeDown,
        })?;

        let (alarm_data, node_data) = tokio::join!(
            client.read_json::<AlarmRecord>(&alarm_file),
            client.read_json::<NodeDownRecord>(&node_file),
        );
        let alarms = alarm_data.map_err(|e| malformed(SnapshotSource::Alarms, e))?;
        let node_downs = node_data.map_err(|e| malformed(SnapshotSource::NodeDown, e))?;

        let snapshot = build_snapshot(
            &alarms,
            &node_downs,
            &sites,
            &config.lists,
            alarm_file.time_created,
            node_file.time_created,
        );

        debug!(
            alerts = snapshot.alerts.len(),
            last_synced = %snapshot.last_synced,
            "alert refresh complete"
        );
        self.inner.store.apply_snapshot(snapshot);
        Ok(())
    }

    /// The session's site index, loading and caching it on first use.
    pub(crate) async fn ensure_site_index(&self) -> Result<Arc<SiteIndex>, CoreError> {
        if let Some(index) = self.inner.site_cache.get() {
            return Ok(index);
        }

        let folder = &self.inner.config.folders.site_reference;
        let file = self
            .inner
            .client
            .latest_file(folder)
            .await?
            .ok_or(CoreError::SourceNotFound {
                source: SnapshotSource::SiteReference,
            })?;
        let text = self.inner.client.read_text(&file).await?;
        let records = parse_site_reference(&text)?;

        debug!(sites = records.len(), "site reference loaded");
        self.inner.site_cache.set(build_site_index(records));
        self.inner
            .site_cache
            .get()
            .ok_or_else(|| CoreError::Internal("site cache cleared during load".into()))
    }

    // ── Filtering ────────────────────────────────────────────────

    /// Apply a filter set to the current snapshot's alerts.
    pub fn filtered_alerts(&self, filters: &FilterSet) -> Vec<Alert> {
        apply_filters(&self.inner.store.snapshot().alerts, filters)
    }

    // ── View state ───────────────────────────────────────────────

    /// The view the host shell is presenting.
    pub fn active_view(&self) -> ActiveView {
        *self.inner.view.borrow()
    }

    /// Note that a per-alert detail view opened. Poll ticks that fire while
    /// it is open leave the refresh pending instead of dispatching it.
    pub fn show_detail(&self) {
        let _ = self.inner.view.send(ActiveView::Detail);
    }

    /// Return to the aggregate view, dispatching any refresh that was
    /// deferred while the detail view was open.
    pub async fn show_portal(&self) {
        let _ = self.inner.view.send(ActiveView::Portal);
        self.consume_pending().await;
    }

    /// The poll state machine's current state.
    pub fn poll_state(&self) -> PollState {
        self.inner.poll.state()
    }

    /// Dispatch a pending poll refresh if the portal is ready for one:
    /// initialized, aggregate view active. Re-arms the timer afterwards.
    async fn consume_pending(&self) {
        if !self.inner.initialized.load(Ordering::Acquire) {
            return;
        }
        if *self.inner.view.borrow() != ActiveView::Portal {
            return;
        }
        if self.inner.poll.consume_pending() {
            if let Err(e) = self.refresh().await {
                warn!(error = %e, "poll refresh failed; keeping previous snapshot");
            }
            self.inner.poll.start();
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Drive the poll cycle: arm the timer, consume PendingRefresh
/// transitions, repeat until cancelled.
async fn poll_task(portal: Portal, cancel: CancellationToken) {
    let mut state_rx = portal.inner.poll.subscribe();
    portal.inner.poll.start();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let pending = *state_rx.borrow_and_update() == PollState::PendingRefresh;
                if pending {
                    portal.consume_pending().await;
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the portal configuration.
fn build_transport(config: &PortalConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        bearer_token: config.bearer_token.clone(),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

/// Map a gateway read error to the per-source malformed variant, keeping
/// other failures on their generic mapping.
fn malformed(source: SnapshotSource, err: sitewatch_api::Error) -> CoreError {
    match err {
        sitewatch_api::Error::Deserialization { message, .. } => CoreError::MalformedSnapshot {
            source,
            reason: message,
        },
        other => other.into(),
    }
}
