// ── Raw-record-to-domain conversions ──
//
// Bridges raw `sitewatch_api` snapshot/list records into canonical
// `sitewatch_core::model` types. Each conversion joins the record against
// the site reference index, normalizes field names, and fills empty
// defaults for missing optional data.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use sitewatch_api::rest::models::{AlarmRecord, CommentRow, NodeDownRecord, SiteRecord};

use crate::cache::SiteIndex;
use crate::model::{Alert, AlertType, Comment, LatLng};

/// Timestamp format the snapshot exporter writes: `DD/MM/YYYY H:mm:ss`.
const SOURCE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Display format used for `time_triggered` and `last_synced`:
/// 12-hour clock with am/pm and a 2-digit year.
pub(crate) const DISPLAY_TIME_FORMAT: &str = "%-I:%M:%S %P %d/%m/%y";

/// Sentinel rendered for unparseable source timestamps. Sorts after every
/// real timestamp (see `trigger_sort_key`).
pub(crate) const INVALID_TIME: &str = "Invalid date";

// ── Helpers ────────────────────────────────────────────────────────

/// Derive the agency facet from a compound customer code: the segment
/// before the first `_`, or empty when the code is absent.
fn agency_of(cst_code: &str) -> String {
    if cst_code.is_empty() {
        String::new()
    } else {
        cst_code.split('_').next().unwrap_or_default().to_owned()
    }
}

/// Parse a source timestamp and re-format it for display.
///
/// Unparseable input yields [`INVALID_TIME`] so a bad record still renders
/// (and sorts last) instead of failing the batch.
fn format_trigger_time(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw.trim(), SOURCE_TIME_FORMAT).map_or_else(
        |_| INVALID_TIME.to_owned(),
        |dt| dt.format(DISPLAY_TIME_FORMAT).to_string(),
    )
}

/// Parse a `time_triggered` display string back into its sort key.
/// `None` (the invalid sentinel) orders after every real timestamp in the
/// aggregator's descending sort.
pub(crate) fn trigger_sort_key(display: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(display, DISPLAY_TIME_FORMAT).ok()
}

/// Format a file creation timestamp with the shared display pattern.
pub(crate) fn display_datetime(dt: DateTime<Utc>) -> String {
    dt.format(DISPLAY_TIME_FORMAT).to_string()
}

/// Longest leading integer of a GPS token, after optional whitespace and
/// sign. Mirrors the truncating parse the upstream dashboard applied, so
/// `"-31.81"` yields `-31` rather than an error.
fn int_prefix(token: &str) -> Option<i32> {
    let trimmed = token.trim_start();
    let (sign, digits_part) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits: String = digits_part
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    i32::try_from(sign * value).ok()
}

/// Split a `"lat, lng"` GPS string on the literal `", "` and parse both
/// tokens by integer prefix. Any missing or non-numeric token yields `None`.
fn parse_gps(gps: &str) -> Option<LatLng> {
    if gps.is_empty() {
        return None;
    }

    let mut tokens = gps.split(", ");
    let lat = int_prefix(tokens.next()?)?;
    let lng = int_prefix(tokens.next()?)?;
    Some(LatLng { lat, lng })
}

/// Location fields from an optional site join. An unresolved join leaves
/// the address empty and the position absent -- it never aborts the batch.
fn site_location(site: Option<&SiteRecord>) -> (String, Option<LatLng>) {
    match site {
        Some(site) => {
            let address = format!(
                "{}\n{}",
                site.site_street_address, site.site_street_address_aux
            );
            (address, parse_gps(&site.site_gps))
        }
        None => (String::new(), None),
    }
}

// ── Alarm → Alert ──────────────────────────────────────────────────

/// Normalize a raw SNMP alarm record into an [`Alert`].
///
/// `list_id` is the backing list the record originates from, retained for
/// later history/ticket reads. The returned alert carries a fresh render
/// id on every call.
pub fn alert_from_alarm(raw: &AlarmRecord, sites: &SiteIndex, list_id: &str) -> Alert {
    let site = sites.get(&raw.site_id);
    let (address, lat_lng) = site_location(site);

    Alert {
        id: Uuid::new_v4(),
        alert_type: AlertType::Alarm,
        region: raw.cst_dsc.clone(),
        site_id: raw.site_id,
        site: raw.site_name.clone(),
        node_name: raw.hst_namea.clone(),
        agency: agency_of(&raw.cst_code),
        equipment_type: raw.typ_dsc.clone(),
        priority: raw.alarm_priority_name.clone(),
        device: raw.alarm_type_name.clone(),
        fault_type: raw.tac_name.clone(),
        status: raw.status_dsc.clone(),
        time_triggered: format_trigger_time(&raw.last_tac_hst_map_tst),
        lat_lng,
        description: raw.hst_dsc.clone(),
        address,
        client: raw.cst_code.clone(),
        vendor: raw.vendor_dsc.clone(),
        model: raw.model_dsc.clone(),
        sp_list_id: list_id.to_owned(),
        sp_id: raw.id,
        sp_created: raw.created.clone(),
        sp_boss_ticket: raw.boss_ticket.clone(),
    }
}

// ── Node-down → Alert ──────────────────────────────────────────────

/// Normalize a raw node-down record into an [`Alert`].
///
/// Node-down records have no fault classification of their own: fault type
/// and status both carry the `"Node down"` literal, and the device column
/// shows the hardware model.
pub fn alert_from_node_down(raw: &NodeDownRecord, sites: &SiteIndex, list_id: &str) -> Alert {
    let site = sites.get(&raw.hst_site_id);
    let (address, lat_lng) = site_location(site);

    Alert {
        id: Uuid::new_v4(),
        alert_type: AlertType::NodeDown,
        region: raw.cst_dsc.clone(),
        site_id: raw.hst_site_id,
        site: raw.site_name.clone(),
        node_name: raw.hst_namea.clone(),
        agency: agency_of(&raw.cst_code),
        equipment_type: raw.typ_dsc.clone(),
        priority: raw.hst_priority_id.clone(),
        device: raw.model_dsc.clone(),
        fault_type: "Node down".to_owned(),
        status: "Node down".to_owned(),
        time_triggered: format_trigger_time(&raw.lo_down_tst),
        lat_lng,
        description: raw.hst_dsc.clone(),
        address,
        client: raw.cst_code.clone(),
        vendor: raw.vendor_dsc.clone(),
        model: raw.model_dsc.clone(),
        sp_list_id: list_id.to_owned(),
        sp_id: raw.id,
        sp_created: raw.created.clone(),
        sp_boss_ticket: raw.boss_ticket.clone(),
    }
}

// ── Comment row → Comment ──────────────────────────────────────────

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            title: row.title,
            node: row.node,
            time_triggered: row.time_triggered,
            body: row.comment,
            created: row.created,
        }
    }
}
