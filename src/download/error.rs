//! Error types for the download module.
//!
//! [`DownloadError`] covers a single HTTP fetch; [`FetchFailure`] is the
//! reason a URL ended the run without a local file, whichever stage failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::mapping::{DeconflictError, MappingError};

/// Errors that can occur while fetching one URL to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create directory, create file, write).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path the source error lacks.

/// Why a URL produced no local file.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The URL could not be mapped to a candidate path.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// No free name could be found for the candidate path.
    #[error(transparent)]
    Deconflict(#[from] DeconflictError),

    /// The target path already exists as a directory.
    #[error("target path {path} exists and is a directory")]
    TargetIsDirectory {
        /// The conflicting directory.
        path: PathBuf,
    },

    /// The target's parent exists but is not a directory.
    #[error("parent path {path} exists but is not a directory")]
    ParentNotDirectory {
        /// The offending parent path.
        path: PathBuf,
    },

    /// An earlier URL in this run already owns the target path.
    #[error("target path {path} is already assigned to another URL in this run")]
    PathAlreadyClaimed {
        /// The contested path.
        path: PathBuf,
    },

    /// The fetch itself failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The fetch task panicked or was cancelled.
    #[error("fetch task aborted: {message}")]
    TaskAborted {
        /// Join error description.
        message: String,
    },
}
