// ── Snapshot aggregation ──
//
// The pure half of a refresh cycle: normalize both raw record sets against
// the site index, merge, derive facet options, and order the result. The
// fetch half lives in `portal` -- everything here is synchronous and
// deterministic for identical inputs.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use sitewatch_api::rest::models::{AlarmRecord, NodeDownRecord};

use crate::cache::SiteIndex;
use crate::config::ListIds;
use crate::convert::{alert_from_alarm, alert_from_node_down, display_datetime, trigger_sort_key};
use crate::filter::FilterKey;
use crate::model::snapshot::ALL_OPTION;
use crate::model::{Alert, AlertSnapshot, FacetOptions};

/// Build one aggregation cycle's output from already-fetched inputs.
///
/// Alarm records are normalized first, node-down records second, then the
/// merged list is ordered most-recent-first. `last_synced` reflects the
/// newer of the two source files' creation times.
pub fn build_snapshot(
    alarms: &[AlarmRecord],
    node_downs: &[NodeDownRecord],
    sites: &SiteIndex,
    lists: &ListIds,
    alarm_file_created: DateTime<Utc>,
    node_file_created: DateTime<Utc>,
) -> AlertSnapshot {
    let mut alerts = Vec::with_capacity(alarms.len() + node_downs.len());
    alerts.extend(
        alarms
            .iter()
            .map(|record| alert_from_alarm(record, sites, &lists.alarms)),
    );
    alerts.extend(
        node_downs
            .iter()
            .map(|record| alert_from_node_down(record, sites, &lists.node_down)),
    );

    let facets = derive_facets(&alerts);
    sort_most_recent_first(&mut alerts);

    let last_synced = display_datetime(alarm_file_created.max(node_file_created));

    AlertSnapshot {
        alerts,
        facets,
        last_synced,
    }
}

/// Derive every facet option list from the merged alert set.
pub fn derive_facets(alerts: &[Alert]) -> FacetOptions {
    FacetOptions {
        agencies: facet_values(alerts, FilterKey::Agency),
        regions: facet_values(alerts, FilterKey::Region),
        sites: facet_values(alerts, FilterKey::Site),
        equipment_types: facet_values(alerts, FilterKey::EquipmentType),
        priorities: facet_values(alerts, FilterKey::Priority),
    }
}

/// Distinct non-empty values of one alert field, sorted ascending, with
/// the `"All"` wildcard prepended.
fn facet_values(alerts: &[Alert], key: FilterKey) -> Vec<String> {
    let distinct: BTreeSet<&str> = alerts
        .iter()
        .map(|alert| key.extract(alert))
        .filter(|value| !value.is_empty())
        .collect();

    let mut options = Vec::with_capacity(distinct.len() + 1);
    options.push(ALL_OPTION.to_owned());
    options.extend(distinct.into_iter().map(ToOwned::to_owned));
    options
}

/// Order alerts most-recent-first by their parsed `time_triggered` value.
///
/// The sort is stable and descending: alerts with equal timestamps keep
/// their input order, and the invalid-timestamp sentinel (which parses to
/// `None`) lands after every real timestamp.
pub fn sort_most_recent_first(alerts: &mut [Alert]) {
    alerts.sort_by_cached_key(|alert| Reverse(trigger_sort_key(&alert.time_triggered)));
}
