// ── Alert domain types ──

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which source shape an alert was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    Alarm,
    NodeDown,
}

/// Map position joined from the site reference.
///
/// Coordinates are whole degrees: the upstream GPS strings are parsed by
/// leading-integer prefix, so fractional degrees truncate. That matches the
/// data consumers have always seen and is covered by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: i32,
    pub lng: i32,
}

/// Unified alert merging the SNMP alarm and node-down source shapes,
/// joined against the site reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Render key, regenerated on every normalization pass. NOT stable
    /// across refresh cycles -- correlate occurrences with
    /// [`correlation_key`](Self::correlation_key) or `(sp_list_id, sp_id)`.
    pub id: Uuid,
    pub alert_type: AlertType,

    // Facet fields
    pub region: String,
    pub site_id: i64,
    pub site: String,
    pub node_name: String,
    pub agency: String,
    pub equipment_type: String,
    pub priority: String,
    pub device: String,
    pub fault_type: String,
    pub status: String,

    /// Display timestamp, `h:mm:ss am/pm DD/MM/YY`. Doubles as the sort
    /// and correlation key.
    pub time_triggered: String,

    // Location (present only when the site join resolved)
    pub lat_lng: Option<LatLng>,

    // Descriptive
    pub description: String,
    /// Two-line street address from the joined site; empty when the join
    /// failed to resolve.
    pub address: String,
    pub client: String,
    pub vendor: String,
    pub model: String,

    // Source linkage, retained for later list reads/writes
    pub sp_list_id: String,
    pub sp_id: i64,
    pub sp_created: String,
    pub sp_boss_ticket: String,
}

impl Alert {
    /// Stable composite key correlating comments/tickets to a specific
    /// alert occurrence: `"{node_name} {time_triggered}"`.
    pub fn correlation_key(&self) -> String {
        format!("{} {}", self.node_name, self.time_triggered)
    }
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            alert_type: AlertType::Alarm,
            region: String::new(),
            site_id: 0,
            site: String::new(),
            node_name: String::new(),
            agency: String::new(),
            equipment_type: String::new(),
            priority: String::new(),
            device: String::new(),
            fault_type: String::new(),
            status: String::new(),
            time_triggered: String::new(),
            lat_lng: None,
            description: String::new(),
            address: String::new(),
            client: String::new(),
            vendor: String::new(),
            model: String::new(),
            sp_list_id: String::new(),
            sp_id: 0,
            sp_created: String::new(),
            sp_boss_ticket: String::new(),
        }
    }
}
