// ── History, comment, and ticket flows ──
//
// Per-alert reads and read-modify-write operations against the backing
// lists. These run independently of the aggregate pipeline: a failure here
// surfaces to the initiating action and never touches the alert snapshot.

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use sitewatch_api::rest::models::{CommentRow, RowId};
use sitewatch_api::rest::odata_escape;

use crate::aggregate::sort_most_recent_first;
use crate::convert::{alert_from_alarm, alert_from_node_down};
use crate::error::{CoreError, SnapshotSource};
use crate::model::{Alert, AlertType, Comment};
use crate::portal::Portal;

/// Page size for history queries against the originating list.
const HISTORY_PAGE_SIZE: u32 = 2000;

/// Page size for comment queries.
const COMMENT_PAGE_SIZE: u32 = 1000;

impl Portal {
    // ── History ──────────────────────────────────────────────────

    /// All recorded occurrences for the alert's node, most recent first.
    ///
    /// Queries the alert's originating list (`sp_list_id`) for every row
    /// with the same node name, following the continuation cursor to
    /// exhaustion, and normalizes rows under the alert's own type.
    pub async fn alert_history(&self, alert: &Alert) -> Result<Vec<Alert>, CoreError> {
        let sites = self.ensure_site_index().await?;
        let filter = format!("hst_namea eq '{}'", odata_escape(&alert.node_name));
        let rows = self
            .collect_rows(&alert.sp_list_id, &filter, None, HISTORY_PAGE_SIZE)
            .await?;
        debug!(node = %alert.node_name, rows = rows.len(), "alert history fetched");

        let mut history = Vec::with_capacity(rows.len());
        match alert.alert_type {
            AlertType::Alarm => {
                for row in rows {
                    let record = decode_row(row, SnapshotSource::Alarms)?;
                    history.push(alert_from_alarm(&record, &sites, &alert.sp_list_id));
                }
            }
            AlertType::NodeDown => {
                for row in rows {
                    let record = decode_row(row, SnapshotSource::NodeDown)?;
                    history.push(alert_from_node_down(&record, &sites, &alert.sp_list_id));
                }
            }
        }

        sort_most_recent_first(&mut history);
        Ok(history)
    }

    // ── Comments ─────────────────────────────────────────────────

    /// Comments recorded against this alert occurrence, newest first.
    pub async fn comments(&self, list_id: &str, alert: &Alert) -> Result<Vec<Comment>, CoreError> {
        self.require_feature(self.config().features.comments, "Commenting")?;

        let filter = format!("Title eq '{}'", odata_escape(&alert.correlation_key()));
        let rows = self
            .collect_rows(list_id, &filter, Some("Created desc"), COMMENT_PAGE_SIZE)
            .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let row: CommentRow = serde_json::from_value(row)
                .map_err(|e| CoreError::Internal(format!("malformed comment row: {e}")))?;
            comments.push(Comment::from(row));
        }
        Ok(comments)
    }

    /// Record a comment against this alert occurrence and return the
    /// refreshed comment set.
    pub async fn add_comment(
        &self,
        list_id: &str,
        alert: &Alert,
        text: &str,
    ) -> Result<Vec<Comment>, CoreError> {
        self.require_feature(self.config().features.comments, "Commenting")?;

        let key = alert.correlation_key();
        let fields = json!({
            "Title": &key,
            "Node": alert.node_name,
            "Timetriggered": alert.time_triggered,
            "Comment": text,
        });
        let row = self
            .client()
            .add_list_row(list_id, &fields)
            .await
            .map_err(CoreError::write_failure)?;
        debug!(row = row.0, key = %key, "comment added");

        self.comments(list_id, alert).await
    }

    // ── Tickets ──────────────────────────────────────────────────

    /// Set the ticket reference for this alert occurrence.
    ///
    /// Inserts the row if the composite key is absent, otherwise updates
    /// the existing row's ticket field. Last writer wins; the list never
    /// grows a second row for the same occurrence.
    pub async fn upsert_ticket_value(
        &self,
        list_id: &str,
        alert: &Alert,
        value: &str,
    ) -> Result<(), CoreError> {
        self.require_feature(self.config().features.ticketing, "Ticketing")?;

        let key = alert.correlation_key();
        let filter = format!("Title eq '{}'", odata_escape(&key));
        let existing = self.client().rows_by_filter(list_id, &filter, 1).await?;

        match existing.first() {
            None => {
                let fields = json!({
                    "Title": &key,
                    "Node": alert.node_name,
                    "Timetriggered": alert.time_triggered,
                    "BOSSticket": value,
                });
                self.client()
                    .add_list_row(list_id, &fields)
                    .await
                    .map_err(CoreError::write_failure)?;
            }
            Some(row) => {
                let row_id = row.get("Id").and_then(serde_json::Value::as_i64).ok_or_else(
                    || CoreError::Internal("ticket row is missing its Id".into()),
                )?;
                let fields = json!({
                    "Node": alert.node_name,
                    "Timetriggered": alert.time_triggered,
                    "BOSSticket": value,
                });
                self.client()
                    .update_list_row(list_id, RowId(row_id), &fields)
                    .await
                    .map_err(CoreError::write_failure)?;
            }
        }

        debug!(key = %key, "ticket value upserted");
        Ok(())
    }

    // ── Shared plumbing ──────────────────────────────────────────

    /// Run a paged list query and drain the continuation cursor.
    async fn collect_rows(
        &self,
        list_id: &str,
        filter: &str,
        order_by: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<serde_json::Value>, CoreError> {
        let mut page = self
            .client()
            .query_list_rows(list_id, filter, order_by, page_size)
            .await?;
        let mut rows = std::mem::take(&mut page.rows);

        while let Some(mut next) = self.client().next_page(&page).await? {
            rows.append(&mut next.rows);
            page = next;
        }
        Ok(rows)
    }

    fn require_feature(&self, enabled: bool, feature: &'static str) -> Result<(), CoreError> {
        if enabled {
            Ok(())
        } else {
            Err(CoreError::FeatureDisabled { feature })
        }
    }
}

/// Decode one history row into its raw record shape.
fn decode_row<T: DeserializeOwned>(
    row: serde_json::Value,
    source: SnapshotSource,
) -> Result<T, CoreError> {
    serde_json::from_value(row).map_err(|e| CoreError::MalformedSnapshot {
        source,
        reason: e.to_string(),
    })
}
