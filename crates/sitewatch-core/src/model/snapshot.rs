// ── Aggregation products ──

use serde::{Deserialize, Serialize};

use super::alert::Alert;
use crate::filter::FilterKey;

/// Synthetic wildcard prepended to every facet option list.
pub const ALL_OPTION: &str = "All";

/// Dropdown option lists derived from the current alert set.
///
/// Each list holds the distinct non-empty values of one alert field,
/// sorted lexicographically, with `"All"` prepended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub agencies: Vec<String>,
    pub regions: Vec<String>,
    pub sites: Vec<String>,
    pub equipment_types: Vec<String>,
    pub priorities: Vec<String>,
}

impl FacetOptions {
    /// The option list backing a given filter key.
    pub fn options_for(&self, key: FilterKey) -> &[String] {
        match key {
            FilterKey::Agency => &self.agencies,
            FilterKey::Region => &self.regions,
            FilterKey::Site => &self.sites,
            FilterKey::EquipmentType => &self.equipment_types,
            FilterKey::Priority => &self.priorities,
        }
    }
}

/// One full aggregation cycle's output. Replaced wholesale on refresh --
/// alerts and facets from different fetches are never mixed.
#[derive(Debug, Clone, Default)]
pub struct AlertSnapshot {
    /// All alerts, most recent first.
    pub alerts: Vec<Alert>,
    pub facets: FacetOptions,
    /// Display timestamp of the newer of the two source files.
    pub last_synced: String,
}
