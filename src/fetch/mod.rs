//! Collection log sources.
//!
//! A log is read either from a JSON file on disk or fetched by username from
//! the collectionlog.net API. Both sources yield a parsed [`CollectionLog`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::collection_log::{CollectionLog, LogParseError};

/// Username recorded for logs that were not fetched by name.
pub const MANUAL_UPLOAD_USERNAME: &str = "Manual Upload";

/// Errors that can occur while obtaining a collection log.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collection log parse error: {0}")]
    Parse(#[from] LogParseError),
}

/// Anything that can produce a player's collection log.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Short human-readable description for log lines.
    fn describe(&self) -> String;

    async fn fetch_log(&self) -> Result<CollectionLog, SourceError>;
}

/// A collection log exported to a JSON file.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch_log(&self) -> Result<CollectionLog, SourceError> {
        let content = fs::read_to_string(&self.path).await?;
        let log = CollectionLog::from_json(&content)?;
        if log.username.is_empty() {
            return Ok(log.with_username(MANUAL_UPLOAD_USERNAME));
        }
        Ok(log)
    }
}

/// Configuration for the remote API client.
#[derive(Debug, Clone)]
pub struct RemoteSourceConfig {
    /// API root, e.g. `https://api.collectionlog.net`
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for RemoteSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.collectionlog.net".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("clog-adviser/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Client for the collectionlog.net user endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    config: RemoteSourceConfig,
}

impl RemoteClient {
    pub fn new(config: RemoteSourceConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("clog-adviser")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, SourceError> {
        Self::new(RemoteSourceConfig::default())
    }

    /// `{base_url}/collectionlog/user/{username}` with the name percent-encoded.
    pub fn profile_url(&self, username: &str) -> Result<Url, SourceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SourceError::InvalidUsername(username.to_string()));
        }

        let invalid = || SourceError::InvalidUrl(self.config.base_url.clone());
        let mut url = Url::parse(&self.config.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["collectionlog", "user", username]);
        Ok(url)
    }

    /// Fetch and parse one user's log.
    pub async fn fetch_user(&self, username: &str) -> Result<CollectionLog, SourceError> {
        let url = self.profile_url(username)?;
        info!("Fetching collection log from {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Received {} bytes for {}", body.len(), username);

        let log = CollectionLog::from_json(&body)?;
        if log.username.is_empty() {
            return Ok(log.with_username(username.trim()));
        }
        Ok(log)
    }

    /// A [`LogSource`] bound to one username.
    pub fn for_user(&self, username: impl Into<String>) -> RemoteLogSource {
        RemoteLogSource {
            client: self.clone(),
            username: username.into(),
        }
    }
}

/// A collection log fetched by username.
#[derive(Debug, Clone)]
pub struct RemoteLogSource {
    client: RemoteClient,
    username: String,
}

impl RemoteLogSource {
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl LogSource for RemoteLogSource {
    fn describe(&self) -> String {
        format!("collectionlog.net user {}", self.username)
    }

    async fn fetch_log(&self) -> Result<CollectionLog, SourceError> {
        self.client.fetch_user(&self.username).await
    }
}
