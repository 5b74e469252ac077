// Folder and file endpoints
//
// Snapshot exports land as timestamped files in configured folders; the
// portal always consumes the most recently created one.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::{StoreClient, truncate_body};
use crate::rest::lists::odata_escape;
use crate::rest::models::{Collection, FileDescriptor};

impl StoreClient {
    /// Fetch the most recently created file in a folder.
    ///
    /// `GET /_api/web/GetFolderByServerRelativePath(decodedurl='{folder}')/Files`
    /// ordered by `TimeCreated desc`, limited to one result. Returns `None`
    /// for an empty folder.
    pub async fn latest_file(&self, folder: &str) -> Result<Option<FileDescriptor>, Error> {
        let url = self.api_url(&format!(
            "web/GetFolderByServerRelativePath(decodedurl='{}')/Files?$orderby=TimeCreated desc&$top=1",
            odata_escape(folder)
        ))?;
        debug!(folder, "querying latest file");

        let page: Collection<FileDescriptor> = self.get_json(url).await?;
        Ok(page.value.into_iter().next())
    }

    /// Read a file's content and decode it as a JSON array of records.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        file: &FileDescriptor,
    ) -> Result<Vec<T>, Error> {
        let body = self.read_text(file).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: truncate_body(body),
        })
    }

    /// Read a file's raw content as text.
    ///
    /// `GET /_api/web/GetFileByServerRelativePath(decodedurl='{url}')/$value`
    pub async fn read_text(&self, file: &FileDescriptor) -> Result<String, Error> {
        let url = self.api_url(&format!(
            "web/GetFileByServerRelativePath(decodedurl='{}')/$value",
            odata_escape(&file.server_relative_url)
        ))?;
        debug!(file = %file.server_relative_url, "reading file content");

        self.get_text(url).await
    }
}
