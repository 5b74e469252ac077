// ── Session-scoped site reference cache ──
//
// The site reference is loaded once per session and read-shared by every
// aggregation cycle. The cache is an explicit injected dependency with
// get/set/clear so tests control it deterministically; the poll cycle
// never invalidates it.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use sitewatch_api::rest::models::SiteRecord;

use crate::error::{CoreError, SnapshotSource};

/// Mapping from `site_id` to its reference record, used for joins.
pub type SiteIndex = HashMap<i64, SiteRecord>;

/// Lock-free holder for the session's site index.
#[derive(Default)]
pub struct SiteCache {
    slot: ArcSwapOption<SiteIndex>,
}

impl SiteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached index, if one has been loaded this session.
    pub fn get(&self) -> Option<Arc<SiteIndex>> {
        self.slot.load_full()
    }

    /// Replace the cached index.
    pub fn set(&self, index: SiteIndex) {
        self.slot.store(Some(Arc::new(index)));
    }

    /// Drop the cached index; the next aggregation reloads it.
    pub fn clear(&self) {
        self.slot.store(None);
    }
}

/// Parse the site reference export.
///
/// The exporter embeds literal line breaks inside string values, which
/// breaks JSON parsing; they are stripped before decoding. That quirk is
/// part of the data contract, not a cleanup opportunity.
pub fn parse_site_reference(text: &str) -> Result<Vec<SiteRecord>, CoreError> {
    let cleaned = text.replace(['\r', '\n'], "");
    serde_json::from_str(&cleaned).map_err(|e| CoreError::MalformedSnapshot {
        source: SnapshotSource::SiteReference,
        reason: e.to_string(),
    })
}

/// Build the join index from the parsed reference records.
pub fn build_site_index(records: Vec<SiteRecord>) -> SiteIndex {
    records.into_iter().map(|s| (s.site_id, s)).collect()
}
