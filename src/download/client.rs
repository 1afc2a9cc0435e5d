//! HTTP client wrapper for streaming URL bodies to disk.
//!
//! This module provides the `HttpClient` struct which issues a single GET per
//! URL with a fixed overall timeout and writes the body to a caller-chosen
//! path, removing the partial file on any failure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::constants::{DEFAULT_PER_HOST_CONCURRENCY, DOWNLOAD_CHUNK_SIZE, REQUEST_TIMEOUT};
use super::error::DownloadError;
use crate::user_agent::BROWSER_USER_AGENT;

/// Settings for building an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Overall request timeout (connect + headers + body).
    pub timeout: Duration,
    /// Idle pooled connections kept per host.
    pub max_idle_per_host: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: REQUEST_TIMEOUT,
            max_idle_per_host: DEFAULT_PER_HOST_CONCURRENCY,
        }
    }
}

/// HTTP client for fetching URLs with streaming writes.
///
/// Create it once per run and share clones; clones reuse the connection pool.
///
/// # Example
///
/// ```no_run
/// use urlmirror_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let fetched = client
///     .fetch_to_path("https://example.com/file.pdf", Path::new("./out/file.pdf"))
///     .await?;
/// println!("Saved {} bytes to {}", fetched.bytes, fetched.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// A body written to disk, plus the response metadata the caller needs.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    /// Path the body was written to.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes: u64,
    /// Raw `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default User-Agent and a 30 second timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_options(&ClientOptions::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client from explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend or resolver
    /// cannot be initialized.
    #[instrument(level = "debug", skip(options), fields(timeout_ms = options.timeout.as_millis()))]
    pub fn with_options(options: &ClientOptions) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(options.timeout)
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.max_idle_per_host)
            .gzip(true)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Fetches `url` and streams the body to `path`, truncating any file there.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Creating or writing the file fails
    ///
    /// On any error after the file was created, the partial file is removed.
    #[must_use = "fetch result contains the written path and response metadata"]
    #[instrument(skip(self), fields(url = %url, path = %path.display()))]
    pub async fn fetch_to_path(&self, url: &str, path: &Path) -> Result<FetchedFile, DownloadError> {
        info!("starting fetch");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        match stream_to_file(&mut file, response, url, path).await {
            Ok(bytes) => {
                info!(bytes, content_type = content_type.as_deref(), "fetch complete");
                Ok(FetchedFile {
                    path: path.to_path_buf(),
                    bytes,
                    content_type,
                })
            }
            Err(e) => {
                drop(file);
                debug!(path = %path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(path).await;
                Err(e)
            }
        }
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams the response body through a fixed-size buffer, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
