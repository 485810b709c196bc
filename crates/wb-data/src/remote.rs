//! Fetching datasets over HTTP

use std::time::Duration;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::info;

use crate::formats::{mime_essence, Format, OCTET_STREAM};
use crate::FetchError;

static FILENAME_PARAM: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'[^']*')?"?([^";]+)"?"#).ok());

/// A downloaded payload and what the server said about it
#[derive(Debug, Clone)]
pub struct RemotePayload {
    /// Name the table will be registered under
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl RemotePayload {
    /// The format to decode with: the declared content type when it names a
    /// known format, then the name's extension, then the payload itself.
    ///
    /// Object stores label most downloads `application/octet-stream`, so that
    /// type says nothing here and is skipped like a missing one.
    pub fn format(&self) -> Format {
        self.content_type
            .as_deref()
            .filter(|mime| mime_essence(mime) != OCTET_STREAM)
            .and_then(|mime| Format::from_mime(mime, &self.bytes))
            .or_else(|| Format::from_extension(&self.name))
            .unwrap_or_else(|| Format::sniff(&self.bytes))
    }
}

/// HTTP client with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
}

impl RemoteFetcher {
    /// Create a new fetcher
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// GET `url`. Any transport failure or non-success status is an error.
    pub async fn fetch(&self, url: &str) -> Result<RemotePayload, FetchError> {
        let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(parsed.clone()).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let disposition = header(CONTENT_DISPOSITION);

        let bytes = response.bytes().await.map_err(transport)?;
        let name = table_name_for(&parsed, disposition.as_deref());
        info!("Fetched {} ({} bytes) as {}", url, bytes.len(), name);

        Ok(RemotePayload {
            name,
            content_type,
            bytes,
        })
    }
}

/// Table name for a download: the attachment file name when given, else
/// the last non-empty path segment, else the host
pub fn table_name_for(url: &Url, content_disposition: Option<&str>) -> String {
    let from_header = content_disposition.and_then(|value| {
        FILENAME_PARAM
            .as_ref()?
            .captures(value)?
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    });

    from_header
        .or_else(|| {
            url.path_segments()?
                .filter(|segment| !segment.is_empty())
                .last()
                .map(str::to_string)
        })
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "download".to_string())
}
