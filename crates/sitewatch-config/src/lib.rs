//! Shared configuration for sitewatch hosts.
//!
//! TOML settings, credential resolution (keyring + env + plaintext),
//! and translation to `sitewatch_core::PortalConfig`. Host shells depend
//! on this crate so the core library never reads files itself.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitewatch_core::{ListIds, PortalConfig, SnapshotFolders, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("a store token is required but none is configured")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML settings structs ───────────────────────────────────────────

/// Top-level TOML settings for one portal deployment.
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Store site root the `_api` surface hangs off.
    pub store_url: String,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub transport: TransportSettings,

    #[serde(default)]
    pub folders: FolderSettings,

    #[serde(default)]
    pub lists: ListSettings,

    #[serde(default)]
    pub features: FeatureSettings,

    /// Poll interval in seconds. 0 disables polling.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            auth: AuthSettings::default(),
            transport: TransportSettings::default(),
            folders: FolderSettings::default(),
            lists: ListSettings::default(),
            features: FeatureSettings::default(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    60
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Bearer token (plaintext — prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Fail loading when no token can be resolved. Off by default:
    /// deployments behind ambient auth run tokenless.
    #[serde(default)]
    pub require_token: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransportSettings {
    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            insecure: false,
            ca_cert: None,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Server-relative folders the snapshot exports land in.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FolderSettings {
    pub alarms: String,
    pub node_down: String,
    pub site_reference: String,
}

/// Backing list identifiers.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListSettings {
    pub alarms: String,
    pub node_down: String,
    pub comments: String,
    pub tickets: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FeatureSettings {
    #[serde(default = "default_true")]
    pub comments: bool,

    #[serde(default = "default_true")]
    pub ticketing: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            comments: true,
            ticketing: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "opsdesk", "sitewatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sitewatch");
    p
}

// ── Settings loading ────────────────────────────────────────────────

/// Load settings from the canonical file plus the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path())
}

/// Load settings from a specific TOML file plus the environment.
///
/// Environment variables use the `SITEWATCH_` prefix with `__` as the
/// section separator, e.g. `SITEWATCH_FOLDERS__ALARMS`.
pub fn load_settings_from(path: &std::path::Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SITEWATCH_").split("__"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Load settings, returning defaults if the file doesn't exist.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_default()
}

// ── Settings saving ─────────────────────────────────────────────────

/// Serialize settings to TOML and write to the canonical path.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the store token from the credential chain:
/// named env var, then system keyring, then plaintext in the settings.
///
/// Returns `None` when nothing is configured and the deployment does not
/// require a token.
pub fn resolve_token(settings: &Settings) -> Result<Option<SecretString>, ConfigError> {
    // 1. Named env var
    if let Some(ref env_name) = settings.auth.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(Some(SecretString::from(val)));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("sitewatch", "store/api-token") {
        if let Ok(secret) = entry.get_password() {
            return Ok(Some(SecretString::from(secret)));
        }
    }

    // 3. Plaintext in settings
    if let Some(ref token) = settings.auth.token {
        return Ok(Some(SecretString::from(token.clone())));
    }

    if settings.auth.require_token {
        Err(ConfigError::NoCredentials)
    } else {
        Ok(None)
    }
}

// ── Translation to PortalConfig ─────────────────────────────────────

/// Build a `PortalConfig` from loaded settings.
pub fn settings_to_portal_config(settings: &Settings) -> Result<PortalConfig, ConfigError> {
    let base_url: url::Url = settings
        .store_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "store_url".into(),
            reason: format!("invalid URL: {}", settings.store_url),
        })?;

    for (field, value) in [
        ("folders.alarms", &settings.folders.alarms),
        ("folders.node_down", &settings.folders.node_down),
        ("folders.site_reference", &settings.folders.site_reference),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation {
                field: field.into(),
                reason: "a snapshot folder path is required".into(),
            });
        }
    }

    let bearer_token = resolve_token(settings)?;

    let tls = if settings.transport.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = settings.transport.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = PortalConfig::new(base_url);
    config.bearer_token = bearer_token;
    config.tls = tls;
    config.timeout = Duration::from_secs(settings.transport.timeout);
    config.folders = SnapshotFolders {
        alarms: settings.folders.alarms.clone(),
        node_down: settings.folders.node_down.clone(),
        site_reference: settings.folders.site_reference.clone(),
    };
    config.lists = ListIds {
        alarms: settings.lists.alarms.clone(),
        node_down: settings.lists.node_down.clone(),
        comments: settings.lists.comments.clone(),
        tickets: settings.lists.tickets.clone(),
    };
    config.features.comments = settings.features.comments;
    config.features.ticketing = settings.features.ticketing;
    config.refresh_interval_secs = settings.refresh_interval_secs;

    Ok(config)
}
