// Store REST response types
//
// Models for the remote store's JSON surface: the flat `value` collection
// envelope, file descriptors, and the raw record shapes carried by the
// snapshot exports and lists. Fields use `#[serde(default)]` liberally
// because the upstream exporter is inconsistent about field presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ── Collection envelope ──────────────────────────────────────────────

/// Flat collection envelope returned by list/file queries:
/// ```json
/// { "value": [...], "odata.nextLink": "https://..." }
/// ```
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    pub value: Vec<T>,
    #[serde(default, rename = "odata.nextLink")]
    pub next_link: Option<String>,
}

/// One page of list rows plus the continuation cursor, if any.
#[derive(Debug)]
pub struct ListPage {
    pub rows: Vec<serde_json::Value>,
    pub(crate) next: Option<Url>,
}

impl ListPage {
    /// Whether a further page can be fetched via
    /// [`StoreClient::next_page`](crate::StoreClient::next_page).
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Identifier of a list row, as returned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RowId(pub i64);

// ── Files ────────────────────────────────────────────────────────────

/// Metadata of a file inside a store folder.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ServerRelativeUrl")]
    pub server_relative_url: String,
    #[serde(rename = "TimeCreated")]
    pub time_created: DateTime<Utc>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Snapshot records ─────────────────────────────────────────────────

/// Raw SNMP alarm record from the alarm snapshot export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmRecord {
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_id: i64,
    #[serde(default)]
    pub cst_dsc: String,
    #[serde(default)]
    pub cst_code: String,
    #[serde(default)]
    pub hst_namea: String,
    #[serde(default)]
    pub vendor_dsc: String,
    #[serde(default)]
    pub model_dsc: String,
    #[serde(default)]
    pub hst_dsc: String,
    #[serde(default)]
    pub hst_id: Option<i64>,
    #[serde(default)]
    pub hst_ip: Option<String>,
    #[serde(default)]
    pub alarm_type_name: String,
    #[serde(default)]
    pub alarm_priority_code: Option<String>,
    #[serde(default)]
    pub alarm_priority_name: String,
    #[serde(default)]
    pub typ_dsc: String,
    #[serde(default)]
    pub tac_name: String,
    #[serde(default)]
    pub tac_dsc: Option<String>,
    /// Trigger timestamp, `DD/MM/YYYY H:mm:ss`.
    #[serde(default)]
    pub last_tac_hst_map_tst: String,
    #[serde(default)]
    pub tac_hold_timer: Option<i64>,
    #[serde(default)]
    pub status_dsc: String,
    #[serde(default, rename = "Id")]
    pub id: i64,
    #[serde(default, rename = "Created")]
    pub created: String,
    #[serde(default, rename = "BOSSticket")]
    pub boss_ticket: String,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Raw node-down record from the node-down snapshot export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDownRecord {
    #[serde(default)]
    pub site_name: String,
    /// Outage timestamp, `DD/MM/YYYY H:mm:ss`.
    #[serde(default)]
    pub lo_down_tst: String,
    #[serde(default)]
    pub hst_site_id: i64,
    #[serde(default)]
    pub cst_dsc: String,
    #[serde(default)]
    pub cst_code: String,
    #[serde(default)]
    pub hst_namea: String,
    #[serde(default)]
    pub vendor_dsc: String,
    #[serde(default)]
    pub model_dsc: String,
    #[serde(default)]
    pub hst_dsc: String,
    #[serde(default)]
    pub hst_id: Option<i64>,
    #[serde(default)]
    pub hst_ip: Option<String>,
    #[serde(default)]
    pub hst_priority_id: String,
    #[serde(default)]
    pub typ_dsc: String,
    #[serde(default, rename = "Id")]
    pub id: i64,
    #[serde(default, rename = "Created")]
    pub created: String,
    #[serde(default, rename = "BOSSticket")]
    pub boss_ticket: String,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Site/location reference record from the site reference export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(default)]
    pub site_id: i64,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_code: String,
    /// `"lat, lng"` text; may be empty.
    #[serde(default)]
    pub site_gps: String,
    #[serde(default)]
    pub site_street_address: String,
    #[serde(default)]
    pub site_street_address_aux: String,
    #[serde(default)]
    pub site_status: String,
    #[serde(default)]
    pub site_region_id: Option<i64>,
    #[serde(default)]
    pub cst_dsc: String,
    #[serde(default)]
    pub cst_code: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub site_class_dsc: String,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── List rows ────────────────────────────────────────────────────────

/// Comment row from the comment list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRow {
    #[serde(default, rename = "Id")]
    pub id: i64,
    /// Composite correlation key: `"{node} {time triggered}"`.
    #[serde(default, rename = "Title")]
    pub title: String,
    #[serde(default, rename = "Node")]
    pub node: String,
    #[serde(default, rename = "Timetriggered")]
    pub time_triggered: String,
    #[serde(default, rename = "Comment")]
    pub comment: String,
    #[serde(default, rename = "Created")]
    pub created: String,
}
