// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Feed fetching over HTTP(S) and from local files.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::FetchError;

/// User-agent sent when a subscription has no override.
pub const DEFAULT_USER_AGENT: &str = concat!("icsync/", env!("CARGO_PKG_VERSION"));

/// Basic-auth credential pair for protected feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

/// A successfully fetched feed body.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    /// Entity tag reported by the server, if any.
    pub etag: Option<String>,
}

/// Capability interface for retrieving a feed body from its location.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(
        &self,
        location: &str,
        credentials: Option<&Credentials>,
        user_agent: Option<&str>,
    ) -> Result<Fetched, FetchError>;
}

/// Production fetcher: HTTP(S) via reqwest with a bounded timeout, plus
/// `file://` and plain-path fallbacks for local feeds.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_http(
        &self,
        location: &str,
        credentials: Option<&Credentials>,
        user_agent: Option<&str>,
    ) -> Result<Fetched, FetchError> {
        let mut request = self.client.get(location);
        if let Some(agent) = user_agent {
            request = request.header("User-Agent", agent);
        }
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.secret));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(location.to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        match response.status() {
            status if status.is_success() => {
                let etag = response
                    .headers()
                    .get("ETag")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.text().await.map_err(|e| {
                    if e.is_timeout() {
                        FetchError::Timeout(location.to_string())
                    } else {
                        FetchError::Network(e.to_string())
                    }
                })?;
                Ok(Fetched { body, etag })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(FetchError::Auth(location.to_string()))
            }
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(location.to_string())),
            status => Err(FetchError::Network(format!(
                "unexpected status {status} from {location}"
            ))),
        }
    }

    async fn fetch_file(&self, path: &Path) -> Result<Fetched, FetchError> {
        match tokio::fs::read_to_string(path).await {
            Ok(body) => Ok(Fetched { body, etag: None }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    #[tracing::instrument(skip(self, credentials))]
    async fn fetch(
        &self,
        location: &str,
        credentials: Option<&Credentials>,
        user_agent: Option<&str>,
    ) -> Result<Fetched, FetchError> {
        if location.is_empty() {
            return Err(FetchError::InvalidUri(location.to_string()));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch_http(location, credentials, user_agent).await
        } else if let Some(path) = location.strip_prefix("file://") {
            self.fetch_file(Path::new(path)).await
        } else if location.contains("://") {
            Err(FetchError::InvalidUri(location.to_string()))
        } else {
            // No scheme: treat as a local path.
            self.fetch_file(Path::new(location)).await
        }
    }
}
