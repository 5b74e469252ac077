// Store REST HTTP client
//
// Wraps `reqwest::Client` with store-specific URL construction and error
// envelope handling. All endpoint modules (files, lists) are implemented
// as inherent methods via separate files.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the remote store's REST API.
///
/// Handles the `{ "odata.error": ... }` failure envelope and `_api`-rooted
/// URL construction. Methods return unwrapped payloads -- callers never see
/// the envelope.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StoreClient {
    /// Create a new store client from a `TransportConfig`.
    ///
    /// `base_url` is the site root the `_api` surface hangs off
    /// (e.g. `https://store.example.net/ops/noc`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a store client with a pre-built `reqwest::Client`.
    ///
    /// Use this when the host environment already owns a configured client
    /// (tests hand in a plain one pointed at a mock server).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The store base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an `_api`-rooted path: `{base}/_api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/_api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON response.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let resp = check_status(resp).await?;

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: truncate_body(body),
        })
    }

    /// Send a GET request and return the raw response body.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let resp = check_status(resp).await?;

        resp.text().await.map_err(Error::Transport)
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        let resp = check_status(resp).await?;

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: truncate_body(body),
        })
    }

    /// Send a MERGE update (POST with method-override headers), expecting
    /// an empty response.
    pub(crate) async fn merge(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("MERGE {}", url);

        let resp = self
            .http
            .post(url)
            .header("X-HTTP-Method", "MERGE")
            .header("IF-MATCH", "*")
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await?;

        Ok(())
    }
}

// ── Error envelope handling ──────────────────────────────────────────

/// Turn non-2xx responses into `Error::Store`, extracting the message from
/// the `odata.error` envelope when present.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else {
            truncate_body(body)
        }
    });

    Err(Error::Store {
        message,
        status: status.as_u16(),
    })
}

/// Pull the human-readable message out of `{"odata.error":{"message":{"value":...}}}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("odata.error")?
        .get("message")?
        .get("value")?
        .as_str()
        .map(ToOwned::to_owned)
}

/// Cap stored response bodies so error values stay log-friendly.
pub(crate) fn truncate_body(body: String) -> String {
    const MAX: usize = 2048;
    if body.len() <= MAX {
        body
    } else {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    }
}
