use async_trait::async_trait;
use futures::stream::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::FetchSettings;
use crate::feed::entry::RawEntry;
use crate::feed::parser::parse_feed;

/// Errors that can occur while retrieving or parsing one source feed.
///
/// None of these are fatal to a run: the source contributes zero entries
/// and aggregation moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Fetch exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Local feed file could not be read
    #[error("Failed to read feed file: {0}")]
    Io(#[from] std::io::Error),
    /// Feed document could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Retrieves and parses one source feed.
///
/// Implementations return the error rather than logging it; [`fetch`] wraps
/// any implementation with the log-and-continue policy.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    async fn fetch_entries(&self, locator: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// Outcome of fetching one configured source.
#[derive(Debug)]
pub struct SourceResult {
    pub locator: String,
    pub result: Result<Vec<RawEntry>, FetchError>,
}

impl SourceResult {
    /// Entries of the source, or none if it failed.
    pub fn into_entries(self) -> Vec<RawEntry> {
        self.result.unwrap_or_default()
    }
}

/// Fetches one source feed without ever failing the caller.
///
/// A failed fetch or parse is logged at warning level with the locator, and
/// the returned [`SourceResult`] carries the error for reporting. No retries.
pub async fn fetch<F>(fetcher: &F, locator: &str) -> SourceResult
where
    F: FetchFeed + ?Sized,
{
    tracing::debug!(feed = %locator, "Fetching source feed");
    let result = fetcher.fetch_entries(locator).await;
    match &result {
        Ok(entries) => {
            tracing::debug!(feed = %locator, entries = entries.len(), "Parsed source feed");
        }
        Err(e) => {
            tracing::warn!(feed = %locator, error = %e, "Failed to fetch feed, skipping");
        }
    }
    SourceResult {
        locator: locator.to_string(),
        result,
    }
}

// ============================================================================
// Locators
// ============================================================================

/// Where a source feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Http(Url),
    File(PathBuf),
}

impl Locator {
    /// Classifies a configured locator.
    ///
    /// `http(s)://` URLs are fetched over the network, `file://` URLs and
    /// anything that does not parse as a URL are treated as filesystem paths.
    pub fn parse(locator: &str) -> Self {
        match Url::parse(locator) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Locator::Http(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Locator::File(path),
                Err(()) => Locator::File(PathBuf::from(locator)),
            },
            _ => Locator::File(PathBuf::from(locator)),
        }
    }
}

// ============================================================================
// HTTP / filesystem fetcher
// ============================================================================

/// Production fetcher: HTTP(S) through `reqwest`, local paths through
/// `tokio::fs`.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_size: usize,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self::with_client(client, settings))
    }

    /// Uses a preconfigured client (custom TLS, proxies, test clients).
    pub fn with_client(client: reqwest::Client, settings: &FetchSettings) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_size: settings.max_feed_size_bytes(),
        }
    }

    async fn read_locator(&self, locator: &Locator) -> Result<Vec<u8>, FetchError> {
        match locator {
            Locator::Http(url) => {
                let response = self.client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(FetchError::HttpStatus(response.status().as_u16()));
                }
                read_limited_bytes(response, self.max_size).await
            }
            Locator::File(path) => {
                let metadata = tokio::fs::metadata(path).await?;
                if metadata.len() > self.max_size as u64 {
                    return Err(FetchError::ResponseTooLarge);
                }
                Ok(tokio::fs::read(path).await?)
            }
        }
    }
}

#[async_trait]
impl FetchFeed for HttpFetcher {
    async fn fetch_entries(&self, locator: &str) -> Result<Vec<RawEntry>, FetchError> {
        let locator = Locator::parse(locator);

        // Timeout covers the body read too, not just the request.
        let bytes = tokio::time::timeout(self.timeout, self.read_locator(&locator))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
