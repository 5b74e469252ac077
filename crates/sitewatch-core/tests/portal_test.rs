// Integration tests for `Portal` against a wiremock store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_core::cache::build_site_index;
use sitewatch_core::{
    Alert, AlertType, CoreError, FilterKey, FilterSet, FilterValue, Portal, PortalConfig,
    SiteCache, SnapshotSource,
};

const ALARM_FOLDER: &str = "/ops/noc/alarms";
const NODE_FOLDER: &str = "/ops/noc/nodes";
const SITE_FOLDER: &str = "/ops/noc/sites";

const ALARM_LIST: &str = "11111111-1111-1111-1111-111111111111";
const NODE_LIST: &str = "22222222-2222-2222-2222-222222222222";
const COMMENT_LIST: &str = "33333333-3333-3333-3333-333333333333";
const TICKET_LIST: &str = "44444444-4444-4444-4444-444444444444";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> PortalConfig {
    let mut config = PortalConfig::new(server.uri().parse().unwrap());
    config.folders.alarms = ALARM_FOLDER.into();
    config.folders.node_down = NODE_FOLDER.into();
    config.folders.site_reference = SITE_FOLDER.into();
    config.lists.alarms = ALARM_LIST.into();
    config.lists.node_down = NODE_LIST.into();
    config.lists.comments = COMMENT_LIST.into();
    config.lists.tickets = TICKET_LIST.into();
    config.refresh_interval_secs = 0;
    config
}

fn folder_listing_path(folder: &str) -> String {
    format!("/_api/web/GetFolderByServerRelativePath(decodedurl='{folder}')/Files")
}

fn file_content_path(rel_url: &str) -> String {
    format!("/_api/web/GetFileByServerRelativePath(decodedurl='{rel_url}')/$value")
}

async fn mount_folder(server: &MockServer, folder: &str, file_name: &str, created: &str) -> String {
    let rel_url = format!("{folder}/{file_name}");
    let body = json!({
        "value": [
            { "Name": file_name, "ServerRelativeUrl": rel_url.clone(), "TimeCreated": created }
        ]
    });

    Mock::given(method("GET"))
        .and(path(folder_listing_path(folder)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;

    rel_url
}

async fn mount_file(server: &MockServer, rel_url: &str, content: String) {
    Mock::given(method("GET"))
        .and(path(file_content_path(rel_url)))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

fn site_reference_text() -> String {
    // Embedded line breaks inside values are a known exporter quirk.
    "[{\"site_id\": 5, \"site_name\": \"Mount\r\n Hope\", \"site_gps\": \"-31, 151\", \
      \"site_street_address\": \"1 Ridge Rd\", \"site_street_address_aux\": \"Mount Hope NSW\"},\n \
      {\"site_id\": 7, \"site_name\": \"Broken Hill\", \"site_gps\": \"-32, 141\", \
      \"site_street_address\": \"9 Mine St\", \"site_street_address_aux\": \"Broken Hill NSW\"}]"
        .to_owned()
}

fn alarm_snapshot() -> String {
    json!([
        {
            "site_name": "Mount Hope",
            "site_id": 5,
            "cst_dsc": "Western",
            "cst_code": "ACME_NET",
            "hst_namea": "NODE-1",
            "typ_dsc": "Router",
            "alarm_priority_name": "Critical",
            "alarm_type_name": "BGP Peer Down",
            "tac_name": "Link failure",
            "status_dsc": "Active",
            "last_tac_hst_map_tst": "01/02/2023 10:00:00",
            "Id": 12,
            "Created": "2023-02-01T09:59:00Z",
            "BOSSticket": ""
        },
        {
            "site_name": "Mount Hope",
            "site_id": 5,
            "cst_dsc": "Western",
            "cst_code": "ACME_NET",
            "hst_namea": "NODE-1",
            "typ_dsc": "Router",
            "alarm_priority_name": "Major",
            "alarm_type_name": "Fan failure",
            "tac_name": "Hardware",
            "status_dsc": "Active",
            "last_tac_hst_map_tst": "01/02/2023 09:00:00",
            "Id": 11,
            "Created": "2023-02-01T08:59:00Z",
            "BOSSticket": ""
        }
    ])
    .to_string()
}

fn node_down_snapshot() -> String {
    json!([
        {
            "site_name": "Broken Hill",
            "lo_down_tst": "02/02/2023 08:30:00",
            "hst_site_id": 7,
            "cst_dsc": "Far West",
            "cst_code": "BETA_NET",
            "hst_namea": "NODE-2",
            "model_dsc": "EX4300",
            "typ_dsc": "Switch",
            "hst_priority_id": "2",
            "Id": 4,
            "Created": "2023-02-02T08:31:00Z",
            "BOSSticket": ""
        }
    ])
    .to_string()
}

/// Mount the full happy-path snapshot surface.
async fn mount_snapshots(server: &MockServer) {
    let site_file = mount_folder(server, SITE_FOLDER, "sites.json", "2023-01-01T00:00:00Z").await;
    mount_file(server, &site_file, site_reference_text()).await;

    let alarm_file =
        mount_folder(server, ALARM_FOLDER, "alarms.json", "2023-02-01T10:05:00Z").await;
    mount_file(server, &alarm_file, alarm_snapshot()).await;

    let node_file = mount_folder(server, NODE_FOLDER, "nodes.json", "2023-02-02T08:35:00Z").await;
    mount_file(server, &node_file, node_down_snapshot()).await;
}

/// How many times a folder's file listing was queried (content reads of
/// files inside the folder are not counted).
async fn listing_hits(server: &MockServer, folder: &str) -> usize {
    let listing = folder_listing_path(folder);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == listing)
        .count()
}

async fn total_requests(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

fn history_alert() -> Alert {
    Alert {
        alert_type: AlertType::Alarm,
        node_name: "NODE-1".into(),
        time_triggered: "10:00:00 am 01/02/23".into(),
        sp_list_id: ALARM_LIST.into(),
        ..Alert::default()
    }
}

// ── Aggregation ─────────────────────────────────────────────────────

#[tokio::test]
async fn init_merges_sources_and_orders_most_recent_first() {
    let server = MockServer::start().await;
    mount_snapshots(&server).await;

    let portal = Portal::new(config(&server)).unwrap();
    portal.init().await.unwrap();

    let snapshot = portal.store().snapshot();
    let order: Vec<&str> = snapshot
        .alerts
        .iter()
        .map(|a| a.node_name.as_str())
        .collect();
    // Node-down outage (02/02 08:30) is newest, then the two alarms.
    assert_eq!(order, vec!["NODE-2", "NODE-1", "NODE-1"]);

    assert_eq!(snapshot.alerts[0].alert_type, AlertType::NodeDown);
    assert_eq!(snapshot.alerts[0].fault_type, "Node down");
    assert_eq!(snapshot.alerts[0].address, "9 Mine St\nBroken Hill NSW");

    assert_eq!(snapshot.facets.agencies, vec!["All", "ACME", "BETA"]);
    assert_eq!(
        snapshot.facets.priorities,
        vec!["All", "2", "Critical", "Major"]
    );

    // The node-down file is newer, so it stamps last_synced.
    assert_eq!(snapshot.last_synced, "8:35:00 am 02/02/23");

    assert!(!portal.store().is_loading());
    assert!(portal.store().last_refresh().is_some());
}

#[tokio::test]
async fn filtered_alerts_constrain_the_current_snapshot() {
    let server = MockServer::start().await;
    mount_snapshots(&server).await;

    let portal = Portal::new(config(&server)).unwrap();
    portal.init().await.unwrap();

    let mut filters = FilterSet::default();
    filters.set(FilterKey::Agency, FilterValue::Text("ACME".into()));

    let kept = portal.filtered_alerts(&filters);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|a| a.agency == "ACME"));
}

#[tokio::test]
async fn empty_alarm_folder_fails_distinctly_and_keeps_prior_state() {
    let server = MockServer::start().await;

    let site_file =
        mount_folder(&server, SITE_FOLDER, "sites.json", "2023-01-01T00:00:00Z").await;
    mount_file(&server, &site_file, site_reference_text()).await;

    // First listing succeeds, every later one finds the folder empty.
    let alarm_rel = format!("{ALARM_FOLDER}/alarms.json");
    Mock::given(method("GET"))
        .and(path(folder_listing_path(ALARM_FOLDER)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "Name": "alarms.json", "ServerRelativeUrl": alarm_rel.clone(), "TimeCreated": "2023-02-01T10:05:00Z" }
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(folder_listing_path(ALARM_FOLDER)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;
    mount_file(&server, &alarm_rel, alarm_snapshot()).await;

    let node_file = mount_folder(&server, NODE_FOLDER, "nodes.json", "2023-02-02T08:35:00Z").await;
    mount_file(&server, &node_file, node_down_snapshot()).await;

    let portal = Portal::new(config(&server)).unwrap();
    portal.init().await.unwrap();
    let before = portal.store().snapshot();
    assert_eq!(before.alerts.len(), 3);

    let err = portal.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::SourceNotFound {
            source: SnapshotSource::Alarms
        }
    ));

    // Stale-but-consistent: the committed snapshot is untouched and the
    // loading indicator cleared.
    let after = portal.store().snapshot();
    assert_eq!(after.alerts.len(), 3);
    assert_eq!(after.last_synced, before.last_synced);
    assert!(!portal.store().is_loading());
}

#[tokio::test]
async fn malformed_node_snapshot_is_reported_for_its_source() {
    let server = MockServer::start().await;

    let site_file =
        mount_folder(&server, SITE_FOLDER, "sites.json", "2023-01-01T00:00:00Z").await;
    mount_file(&server, &site_file, site_reference_text()).await;

    let alarm_file =
        mount_folder(&server, ALARM_FOLDER, "alarms.json", "2023-02-01T10:05:00Z").await;
    mount_file(&server, &alarm_file, alarm_snapshot()).await;

    let node_file = mount_folder(&server, NODE_FOLDER, "nodes.json", "2023-02-02T08:35:00Z").await;
    mount_file(&server, &node_file, "<html>maintenance page</html>".into()).await;

    let portal = Portal::new(config(&server)).unwrap();
    let err = portal.init().await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::MalformedSnapshot {
            source: SnapshotSource::NodeDown,
            ..
        }
    ));
    assert!(portal.store().snapshot().alerts.is_empty());
    assert!(!portal.store().is_loading());
}

#[tokio::test]
async fn site_reference_loads_once_per_session() {
    let server = MockServer::start().await;
    mount_snapshots(&server).await;

    let portal = Portal::new(config(&server)).unwrap();
    portal.init().await.unwrap();
    portal.refresh().await.unwrap();
    portal.refresh().await.unwrap();

    assert_eq!(listing_hits(&server, SITE_FOLDER).await, 1);
}

#[tokio::test]
async fn concurrent_refreshes_are_single_flight() {
    let server = MockServer::start().await;

    let site_file =
        mount_folder(&server, SITE_FOLDER, "sites.json", "2023-01-01T00:00:00Z").await;
    mount_file(&server, &site_file, site_reference_text()).await;

    // Slow the alarm listing down so the second call overlaps the first.
    let alarm_rel = format!("{ALARM_FOLDER}/alarms.json");
    Mock::given(method("GET"))
        .and(path(folder_listing_path(ALARM_FOLDER)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "value": [
                        { "Name": "alarms.json", "ServerRelativeUrl": alarm_rel.clone(), "TimeCreated": "2023-02-01T10:05:00Z" }
                    ]
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    mount_file(&server, &alarm_rel, alarm_snapshot()).await;

    let node_file = mount_folder(&server, NODE_FOLDER, "nodes.json", "2023-02-02T08:35:00Z").await;
    mount_file(&server, &node_file, node_down_snapshot()).await;

    let portal = Portal::new(config(&server)).unwrap();

    let (first, second) = tokio::join!(portal.refresh(), portal.refresh());
    first.unwrap();
    second.unwrap();

    // Only one of the two calls actually fetched.
    assert_eq!(listing_hits(&server, ALARM_FOLDER).await, 1);
}

// ── Poll cycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn poll_refresh_is_deferred_while_a_detail_view_is_open() {
    let server = MockServer::start().await;
    mount_snapshots(&server).await;

    let mut config = config(&server);
    config.refresh_interval_secs = 1;

    let portal = Portal::new(config).unwrap();
    portal.init().await.unwrap();
    assert_eq!(listing_hits(&server, ALARM_FOLDER).await, 1);

    portal.show_detail();
    tokio::time::sleep(Duration::from_millis(1600)).await;

    // The timer fired, but the detail view deferred the refresh.
    assert_eq!(listing_hits(&server, ALARM_FOLDER).await, 1);

    portal.show_portal().await;
    assert_eq!(listing_hits(&server, ALARM_FOLDER).await, 2);

    portal.shutdown().await;
}

// ── History ─────────────────────────────────────────────────────────

#[tokio::test]
async fn alert_history_drains_the_cursor_and_sorts_descending() {
    let server = MockServer::start().await;

    let cache = Arc::new(SiteCache::new());
    cache.set(build_site_index(vec![]));

    let page_two_url = format!("{}/_api/history-page-two", server.uri());
    let page_one = json!({
        "value": [
            { "hst_namea": "NODE-1", "last_tac_hst_map_tst": "01/02/2023 09:00:00", "Id": 11 }
        ],
        "odata.nextLink": page_two_url
    });
    let page_two = json!({
        "value": [
            { "hst_namea": "NODE-1", "last_tac_hst_map_tst": "01/02/2023 10:00:00", "Id": 12 }
        ]
    });

    Mock::given(method("GET"))
        .and(path(format!("/_api/web/lists(guid'{ALARM_LIST}')/items")))
        .and(query_param("$filter", "hst_namea eq 'NODE-1'"))
        .and(query_param("$top", "2000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_one))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_api/history-page-two"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_two))
        .mount(&server)
        .await;

    let portal = Portal::with_cache(config(&server), cache).unwrap();
    let history = portal.alert_history(&history_alert()).await.unwrap();

    assert_eq!(history.len(), 2);
    // Most recent occurrence first, regardless of page order.
    assert_eq!(history[0].sp_id, 12);
    assert_eq!(history[1].sp_id, 11);
    assert!(history.iter().all(|a| a.alert_type == AlertType::Alarm));
}

// ── Comments ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_comment_inserts_and_returns_the_refreshed_set() {
    let server = MockServer::start().await;

    let cache = Arc::new(SiteCache::new());
    cache.set(build_site_index(vec![]));

    let key = "NODE-1 10:00:00 am 01/02/23";
    let insert_fields = json!({
        "Title": key,
        "Node": "NODE-1",
        "Timetriggered": "10:00:00 am 01/02/23",
        "Comment": "Investigating"
    });

    Mock::given(method("POST"))
        .and(path(format!("/_api/web/lists(guid'{COMMENT_LIST}')/items")))
        .and(body_json(&insert_fields))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "Id": 9 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/_api/web/lists(guid'{COMMENT_LIST}')/items")))
        .and(query_param("$filter", format!("Title eq '{key}'")))
        .and(query_param("$orderby", "Created desc"))
        .and(query_param("$top", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "Id": 9,
                    "Title": key,
                    "Node": "NODE-1",
                    "Timetriggered": "10:00:00 am 01/02/23",
                    "Comment": "Investigating",
                    "Created": "2023-02-01T11:00:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    let portal = Portal::with_cache(config(&server), cache).unwrap();
    let comments = portal
        .add_comment(COMMENT_LIST, &history_alert(), "Investigating")
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].body, "Investigating");
    assert_eq!(comments[0].title, key);
}

#[tokio::test]
async fn disabled_features_short_circuit_without_io() {
    let server = MockServer::start().await;

    let mut config = config(&server);
    config.features.comments = false;
    config.features.ticketing = false;

    let portal = Portal::new(config).unwrap();
    let alert = history_alert();

    assert!(matches!(
        portal.comments(COMMENT_LIST, &alert).await,
        Err(CoreError::FeatureDisabled { .. })
    ));
    assert!(matches!(
        portal.add_comment(COMMENT_LIST, &alert, "text").await,
        Err(CoreError::FeatureDisabled { .. })
    ));
    assert!(matches!(
        portal.upsert_ticket_value(TICKET_LIST, &alert, "INC1").await,
        Err(CoreError::FeatureDisabled { .. })
    ));

    assert_eq!(total_requests(&server).await, 0);
}

// ── Tickets ─────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_ticket_inserts_then_updates_the_same_row() {
    let server = MockServer::start().await;

    let cache = Arc::new(SiteCache::new());
    cache.set(build_site_index(vec![]));

    let key = "NODE-1 10:00:00 am 01/02/23";

    // First lookup misses; every later one finds the row.
    Mock::given(method("GET"))
        .and(path(format!("/_api/web/lists(guid'{TICKET_LIST}')/items")))
        .and(query_param("$filter", format!("Title eq '{key}'")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/_api/web/lists(guid'{TICKET_LIST}')/items")))
        .and(query_param("$filter", format!("Title eq '{key}'")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [ { "Id": 42, "Title": key, "BOSSticket": "INC0001" } ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/_api/web/lists(guid'{TICKET_LIST}')/items")))
        .and(body_json(json!({
            "Title": key,
            "Node": "NODE-1",
            "Timetriggered": "10:00:00 am 01/02/23",
            "BOSSticket": "INC0001"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "Id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/_api/web/lists(guid'{TICKET_LIST}')/items(42)"
        )))
        .and(header("X-HTTP-Method", "MERGE"))
        .and(body_json(json!({
            "Node": "NODE-1",
            "Timetriggered": "10:00:00 am 01/02/23",
            "BOSSticket": "INC0002"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let portal = Portal::with_cache(config(&server), cache).unwrap();
    let alert = history_alert();

    // Absent -> insert; present -> update. Last writer wins, one row total.
    portal
        .upsert_ticket_value(TICKET_LIST, &alert, "INC0001")
        .await
        .unwrap();
    portal
        .upsert_ticket_value(TICKET_LIST, &alert, "INC0002")
        .await
        .unwrap();
}
