//! Trigger row sources.
//!
//! The external mapping is two parallel columns (trigger text, response text)
//! with a header row. [`SheetValuesSource`] reads them from the Google Sheets
//! `values.get` endpoint; tests implement [`TriggerSource`] with in-memory
//! fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use kotik_types::ApiKey;

/// Canonical Google Sheets API base URL.
pub const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

const FETCH_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

/// One spreadsheet row: trigger text and one candidate response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub trigger: String,
    pub response: String,
}

impl SheetRow {
    #[must_use]
    pub fn new(trigger: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            response: response.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("trigger source request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("trigger source returned status {status}")]
    Status { status: u16, body: String },
    #[error("trigger source returned a malformed payload: {0}")]
    Malformed(String),
}

/// A read-only remote mapping of trigger rows.
#[async_trait]
pub trait TriggerSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SheetRow>, SourceError>;
}

/// Google Sheets `values.get` source.
///
/// Fetches `GET {base}/v4/spreadsheets/{id}/values/{range}?key=...` and reads
/// the row arrays out of the `values` field. The first row is a header and is
/// skipped; rows missing either column are dropped.
pub struct SheetValuesSource {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: ApiKey,
    range: String,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetValuesSource {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        api_key: ApiKey,
        range: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_base_url(SHEETS_API_BASE_URL, spreadsheet_id, api_key, range)
    }

    /// Same as [`SheetValuesSource::new`] with an overridable base URL for
    /// tests against a local mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        api_key: ApiKey,
        range: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key,
            range: range.into(),
        })
    }
}

#[async_trait]
impl TriggerSource for SheetValuesSource {
    async fn fetch(&self) -> Result<Vec<SheetRow>, SourceError> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, self.range
        );
        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret()),
                ("majorDimension", "ROWS"),
            ])
            .send()
            .await
            // The request URL carries the API key as a query parameter;
            // strip it before the error can reach a log line.
            .map_err(|e| SourceError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_BYTES {
                let mut end = MAX_ERROR_BODY_BYTES;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ValuesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.without_url().to_string()))?;

        let rows = payload
            .values
            .into_iter()
            .skip(1) // header row
            .filter_map(|mut cells| {
                if cells.len() < 2 {
                    return None;
                }
                let response = cells.swap_remove(1);
                let trigger = cells.swap_remove(0);
                Some(SheetRow { trigger, response })
            })
            .collect();
        Ok(rows)
    }
}
