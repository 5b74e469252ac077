// ── Core error types ──
//
// User-facing errors from sitewatch-core. These are NOT transport-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<sitewatch_api::Error>` impl translates gateway errors into
// domain-appropriate variants.

use thiserror::Error;

/// Which data source a load failure belongs to.
///
/// Failures are reported distinctly per source so an empty alarm folder is
/// never conflated with a missing node-down export or site reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SnapshotSource {
    #[strum(serialize = "alarm snapshot")]
    Alarms,
    #[strum(serialize = "node-down snapshot")]
    NodeDown,
    #[strum(serialize = "site reference")]
    SiteReference,
}

// `SnapshotSource` is stored in the `source` field of `CoreError` variants,
// which `thiserror` treats as the error cause and therefore requires to
// implement `std::error::Error`. It has `Debug` + `Display` (via `strum`),
// so the trait's default methods suffice.
impl std::error::Error for SnapshotSource {}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Load errors ──────────────────────────────────────────────────
    #[error("No file found for the {source}")]
    SourceNotFound { source: SnapshotSource },

    #[error("Malformed {source}: {reason}")]
    MalformedSnapshot {
        source: SnapshotSource,
        reason: String,
    },

    // ── Write errors ─────────────────────────────────────────────────
    #[error("Remote write rejected: {message}")]
    RemoteWriteFailure { message: String },

    // ── Feature gating ───────────────────────────────────────────────
    #[error("{feature} is disabled for this portal")]
    FeatureDisabled { feature: &'static str },

    // ── Gateway errors (wrapped, not exposed raw) ────────────────────
    #[error("Store error: {message}")]
    Store {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Cannot reach store: {reason}")]
    ConnectionFailed { reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a gateway error raised by a comment/ticket write path.
    ///
    /// Write failures surface to the initiating action as
    /// [`RemoteWriteFailure`] rather than the generic store mapping.
    pub(crate) fn write_failure(err: sitewatch_api::Error) -> Self {
        Self::RemoteWriteFailure {
            message: err.to_string(),
        }
    }
}

// ── Conversion from gateway errors ───────────────────────────────────

impl From<sitewatch_api::Error> for CoreError {
    fn from(err: sitewatch_api::Error) -> Self {
        match err {
            sitewatch_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Store {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            sitewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sitewatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            sitewatch_api::Error::Store { message, status } => CoreError::Store {
                message,
                status: Some(status),
            },
            sitewatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_sources_render_distinctly() {
        let rendered: Vec<String> = [
            SnapshotSource::Alarms,
            SnapshotSource::NodeDown,
            SnapshotSource::SiteReference,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            rendered,
            vec!["alarm snapshot", "node-down snapshot", "site reference"]
        );
    }

    #[test]
    fn source_not_found_names_the_source() {
        let err = CoreError::SourceNotFound {
            source: SnapshotSource::NodeDown,
        };
        assert_eq!(err.to_string(), "No file found for the node-down snapshot");
    }
}
