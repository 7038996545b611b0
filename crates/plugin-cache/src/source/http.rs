//! HTTP bundle source.
//!
//! A bundle endpoint publishes a plain-text `files.txt` listing one
//! bundle-relative path per line; every listed path is fetched from
//! `{endpoint}/{path}`.

use async_trait::async_trait;
use plugin_core::traits::BundleSource;
use plugin_core::{Error, PluginEntry, Result};

/// Name of the file listing published at every HTTP endpoint.
pub const FILE_LIST_NAME: &str = "files.txt";

/// Bundle source fetching files over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpBundleSource {
    client: reqwest::Client,
}

impl HttpBundleSource {
    /// Creates a source with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source with a preconfigured client (timeouts, TLS roots).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn source_error(entry: &PluginEntry, message: impl std::fmt::Display) -> Error {
        Error::SourceError {
            endpoint: entry.endpoint.clone(),
            message: message.to_string(),
        }
    }

    async fn get(&self, entry: &PluginEntry, path: &str) -> Result<reqwest::Response> {
        let url = file_url(&entry.endpoint, path);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::source_error(entry, e))?;

        if !response.status().is_success() {
            return Err(Self::source_error(
                entry,
                format!("GET {url} returned {}", response.status()),
            ));
        }

        Ok(response)
    }
}

/// Joins an endpoint and a bundle-relative path with exactly one `/`.
fn file_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Parses a `files.txt` body, skipping blank lines.
fn parse_file_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl BundleSource for HttpBundleSource {
    async fn list_files(&self, entry: &PluginEntry) -> Result<Vec<String>> {
        let body = self
            .get(entry, FILE_LIST_NAME)
            .await?
            .text()
            .await
            .map_err(|e| Self::source_error(entry, e))?;

        Ok(parse_file_list(&body))
    }

    async fn fetch_file(&self, entry: &PluginEntry, path: &str, limit: u64) -> Result<Vec<u8>> {
        let mut response = self.get(entry, path).await?;
        let too_large = |size| Error::FileTooLarge {
            path: path.to_string(),
            size,
            limit,
        };

        if let Some(size) = response.content_length()
            && size > limit
        {
            return Err(too_large(size));
        }

        // Content-Length may be absent or wrong; stop reading at the limit.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::source_error(entry, e))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > limit {
                return Err(too_large(size));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}
