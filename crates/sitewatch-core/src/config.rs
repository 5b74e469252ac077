// ── Runtime portal configuration ──
//
// These types describe *what* the portal reads and writes: store location,
// snapshot folders, backing lists, and feature toggles. The host constructs
// a `PortalConfig` and hands it in -- core never reads config files.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// System CA store (strict). Default for hosted stores.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (stores behind self-signed test proxies).
    DangerAcceptInvalid,
}

impl PartialEq for TlsVerification {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SystemDefaults, Self::SystemDefaults)
            | (Self::DangerAcceptInvalid, Self::DangerAcceptInvalid) => true,
            (Self::CustomCa(a), Self::CustomCa(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TlsVerification {}

/// Server-relative folder paths the snapshot exports land in.
#[derive(Debug, Clone)]
pub struct SnapshotFolders {
    pub alarms: String,
    pub node_down: String,
    pub site_reference: String,
}

/// Identifiers of the backing lists.
#[derive(Debug, Clone)]
pub struct ListIds {
    /// List the alarm snapshot rows originate from.
    pub alarms: String,
    /// List the node-down snapshot rows originate from.
    pub node_down: String,
    /// Comment list.
    pub comments: String,
    /// Ticket reference list.
    pub tickets: String,
}

/// Feature toggles surfaced by the host configuration.
#[derive(Debug, Clone, Copy)]
pub struct FeatureToggles {
    pub comments: bool,
    pub ticketing: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            comments: true,
            ticketing: true,
        }
    }
}

/// Configuration for a single portal instance.
///
/// Built by the host shell, passed to `Portal`.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Store site root the `_api` surface hangs off.
    pub base_url: Url,
    /// Bearer token for the store, if the deployment uses one.
    pub bearer_token: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Snapshot folder paths.
    pub folders: SnapshotFolders,
    /// Backing list identifiers.
    pub lists: ListIds,
    /// Feature toggles.
    pub features: FeatureToggles,
    /// How often the poll timer fires (seconds). 0 = polling disabled.
    pub refresh_interval_secs: u64,
}

impl PortalConfig {
    /// Minimal config pointing at `base_url`, with empty folder/list wiring.
    ///
    /// Tests and hosts fill in the folders and lists they use.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            bearer_token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            folders: SnapshotFolders {
                alarms: String::new(),
                node_down: String::new(),
                site_reference: String::new(),
            },
            lists: ListIds {
                alarms: String::new(),
                node_down: String::new(),
                comments: String::new(),
                tickets: String::new(),
            },
            features: FeatureToggles::default(),
            refresh_interval_secs: 60,
        }
    }
}
