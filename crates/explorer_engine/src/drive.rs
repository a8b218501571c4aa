//! Client for the remote drive's files endpoint.

use std::time::Duration;

use bytes::Bytes;
use explorer_core::{Entry, Payload};
use explorer_logging::explorer_debug;
use futures_util::StreamExt;
use reqwest::Url;
use serde::Deserialize;

use crate::{ExplorerError, FailureKind};

pub const DEFAULT_FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Clone)]
pub struct DriveSettings {
    pub files_endpoint: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub max_document_bytes: u64,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            files_endpoint: DEFAULT_FILES_ENDPOINT.to_string(),
            api_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_size: 1000,
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

/// One page of a child listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default)]
    pub files: Vec<Entry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The remote store protocol: metadata, one listing page, raw document body.
#[async_trait::async_trait]
pub trait DriveApi: Send + Sync {
    async fn metadata(&self, id: &str) -> Result<Entry, ExplorerError>;

    /// Non-trashed direct children of `parent`, one page at a time.
    async fn list_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, ExplorerError>;

    async fn fetch_document(&self, id: &str) -> Result<Bytes, ExplorerError>;
}

/// Parses a document body into a payload; anything but a JSON object is
/// malformed.
pub fn parse_payload(bytes: &[u8]) -> Result<Payload, ExplorerError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|err| ExplorerError::new(FailureKind::Malformed, format!("invalid JSON: {err}")))?;
    Payload::from_value(value).ok_or_else(|| {
        ExplorerError::new(FailureKind::Malformed, "invalid JSON: empty or not an object")
    })
}

#[derive(Debug, Clone)]
pub struct ReqwestDriveApi {
    settings: DriveSettings,
    client: reqwest::Client,
}

impl ReqwestDriveApi {
    pub fn new(settings: DriveSettings) -> Result<Self, ExplorerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ExplorerError::new(FailureKind::TransientNetwork, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn files_url(&self, id: Option<&str>) -> Result<Url, ExplorerError> {
        let mut url = Url::parse(&self.settings.files_endpoint)
            .map_err(|err| ExplorerError::new(FailureKind::Malformed, err.to_string()))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| {
                    ExplorerError::new(FailureKind::Malformed, "files endpoint cannot take a path")
                })?
                .pop_if_empty()
                .push(id);
        }
        url.query_pairs_mut().append_pair("key", &self.settings.api_key);
        Ok(url)
    }

    async fn get_bytes(&self, url: Url, max_bytes: Option<u64>) -> Result<Bytes, ExplorerError> {
        explorer_debug!("GET {}", url.path());
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("request failed").to_string();
            let body = response.bytes().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(reason);
            return Err(ExplorerError::new(
                classify_status(status.as_u16()),
                format!("{} {}", status.as_u16(), message),
            ));
        }

        if let (Some(max), Some(len)) = (max_bytes, response.content_length()) {
            if len > max {
                return Err(too_large(max, len));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if let Some(max) = max_bytes {
                if next_len > max {
                    return Err(too_large(max, next_len));
                }
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ExplorerError> {
        let body = self.get_bytes(url, None).await?;
        serde_json::from_slice(&body)
            .map_err(|err| ExplorerError::new(FailureKind::Malformed, err.to_string()))
    }
}

#[async_trait::async_trait]
impl DriveApi for ReqwestDriveApi {
    async fn metadata(&self, id: &str) -> Result<Entry, ExplorerError> {
        let mut url = self.files_url(Some(id))?;
        url.query_pairs_mut()
            .append_pair("fields", "id,name,mimeType")
            .append_pair("supportsAllDrives", "true");
        self.get_json(url).await
    }

    async fn list_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, ExplorerError> {
        let mut url = self.files_url(None)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &parents_query(parent))
                .append_pair("fields", "nextPageToken,files(id,name,mimeType)")
                .append_pair("pageSize", &self.settings.page_size.to_string())
                .append_pair("includeItemsFromAllDrives", "true")
                .append_pair("supportsAllDrives", "true");
            if let Some(token) = page_token.filter(|token| !token.is_empty()) {
                query.append_pair("pageToken", token);
            }
        }
        self.get_json(url).await
    }

    async fn fetch_document(&self, id: &str) -> Result<Bytes, ExplorerError> {
        let mut url = self.files_url(Some(id))?;
        url.query_pairs_mut().append_pair("alt", "media");
        self.get_bytes(url, Some(self.settings.max_document_bytes))
            .await
    }
}

/// Children query for `parent`. Quotes and backslashes in the id are escaped
/// so the id stays one string literal of the query language.
fn parents_query(parent: &str) -> String {
    let mut literal = String::with_capacity(parent.len());
    for c in parent.chars() {
        if c == '\\' || c == '\'' {
            literal.push('\\');
        }
        literal.push(c);
    }
    format!("'{literal}' in parents and trashed=false")
}

fn classify_status(status: u16) -> FailureKind {
    match status {
        403 | 429 => FailureKind::RateLimited,
        404 => FailureKind::NotFound,
        _ => FailureKind::TransientNetwork,
    }
}

/// `error.message` of a structured error body, if any.
fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .filter(|message| !message.is_empty())
}

fn too_large(max: u64, actual: u64) -> ExplorerError {
    ExplorerError::new(
        FailureKind::Malformed,
        format!("document too large (max {max}, actual {actual})"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ExplorerError {
    if err.is_timeout() {
        return ExplorerError::new(FailureKind::TransientNetwork, format!("timeout: {err}"));
    }
    if err.is_decode() {
        return ExplorerError::new(FailureKind::Malformed, err.to_string());
    }
    ExplorerError::new(FailureKind::TransientNetwork, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{classify_status, error_message, parents_query};
    use crate::FailureKind;

    #[test]
    fn quota_statuses_are_rate_limited() {
        assert_eq!(classify_status(403), FailureKind::RateLimited);
        assert_eq!(classify_status(429), FailureKind::RateLimited);
        assert_eq!(classify_status(404), FailureKind::NotFound);
        assert_eq!(classify_status(500), FailureKind::TransientNetwork);
    }

    #[test]
    fn parent_ids_are_quoted_as_one_literal() {
        assert_eq!(parents_query("abc"), "'abc' in parents and trashed=false");
        assert_eq!(
            parents_query(r"a'b\c"),
            r"'a\'b\\c' in parents and trashed=false"
        );
    }

    #[test]
    fn structured_error_message_is_extracted() {
        let body = br#"{"error":{"code":403,"message":"Rate Limit Exceeded"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Rate Limit Exceeded"));
        assert_eq!(error_message(b"<html>"), None);
    }
}
