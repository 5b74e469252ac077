// List row endpoints
//
// Cursor-paged queries plus row insert/update. Rows come back as raw JSON
// objects; callers decode them into the record shape the list carries.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rest::client::StoreClient;
use crate::rest::models::{Collection, ListPage, RowId};

/// Escape a string for embedding in a single-quoted OData literal.
pub fn odata_escape(value: &str) -> String {
    value.replace('\'', "''")
}

impl StoreClient {
    /// Query list rows with a filter expression, returning the first page.
    ///
    /// `GET /_api/web/lists(guid'{id}')/items?$filter=...&$top=...`
    ///
    /// Follow the continuation cursor with [`next_page`](Self::next_page)
    /// until [`ListPage::has_next`] is false.
    pub async fn query_list_rows(
        &self,
        list_id: &str,
        filter: &str,
        order_by: Option<&str>,
        page_size: u32,
    ) -> Result<ListPage, Error> {
        let mut path = format!("web/lists(guid'{list_id}')/items?$filter={filter}&$top={page_size}");
        if let Some(order) = order_by {
            path.push_str("&$orderby=");
            path.push_str(order);
        }
        let url = self.api_url(&path)?;
        debug!(list_id, filter, page_size, "querying list rows");

        self.fetch_page(url).await
    }

    /// Fetch the page after `page`, or `None` when the cursor is exhausted.
    pub async fn next_page(&self, page: &ListPage) -> Result<Option<ListPage>, Error> {
        let Some(ref next) = page.next else {
            return Ok(None);
        };
        debug!(%next, "following list continuation cursor");

        self.fetch_page(next.clone()).await.map(Some)
    }

    /// One-shot filtered query without cursor handling.
    ///
    /// Used for existence checks where a single page is enough.
    pub async fn rows_by_filter(
        &self,
        list_id: &str,
        filter: &str,
        top: u32,
    ) -> Result<Vec<serde_json::Value>, Error> {
        let url = self.api_url(&format!(
            "web/lists(guid'{list_id}')/items?$filter={filter}&$top={top}"
        ))?;
        debug!(list_id, filter, top, "querying rows by filter");

        let page: Collection<serde_json::Value> = self.get_json(url).await?;
        Ok(page.value)
    }

    /// Insert a row into a list, returning the new row's id.
    ///
    /// `POST /_api/web/lists(guid'{id}')/items`
    pub async fn add_list_row(
        &self,
        list_id: &str,
        fields: &serde_json::Value,
    ) -> Result<RowId, Error> {
        let url = self.api_url(&format!("web/lists(guid'{list_id}')/items"))?;
        debug!(list_id, "adding list row");

        #[derive(Deserialize)]
        struct Added {
            #[serde(rename = "Id")]
            id: i64,
        }

        let added: Added = self.post_json(url, fields).await?;
        Ok(RowId(added.id))
    }

    /// Update fields on an existing row (last writer wins).
    ///
    /// `POST /_api/web/lists(guid'{id}')/items({row})` with MERGE override.
    pub async fn update_list_row(
        &self,
        list_id: &str,
        row_id: RowId,
        fields: &serde_json::Value,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("web/lists(guid'{list_id}')/items({})", row_id.0))?;
        debug!(list_id, row_id = row_id.0, "updating list row");

        self.merge(url, fields).await
    }

    async fn fetch_page(&self, url: Url) -> Result<ListPage, Error> {
        let page: Collection<serde_json::Value> = self.get_json(url).await?;
        let next = match page.next_link {
            Some(ref link) => Some(Url::parse(link)?),
            None => None,
        };
        Ok(ListPage {
            rows: page.value,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(odata_escape("O'Brien's"), "O''Brien''s");
        assert_eq!(odata_escape("plain"), "plain");
    }
}
