//! Error types for path building and deconfliction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a URL from being mapped to a candidate path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The URL does not parse, or has no scheme or host.
    #[error("malformed URL (missing scheme or host): {url}")]
    MalformedUrl {
        /// The rejected URL.
        url: String,
    },

    /// A decoded path segment would escape the base directory.
    #[error("unsafe path segment {segment:?} in {url}")]
    UnsafeSegment {
        /// The URL being mapped.
        url: String,
        /// The offending decoded segment.
        segment: String,
    },

    /// Policy application left nothing to use as a filename.
    #[error("could not determine a filename for {url}")]
    EmptyFilename {
        /// The URL being mapped.
        url: String,
    },
}

impl MappingError {
    /// Creates a malformed URL error.
    pub fn malformed_url(url: impl Into<String>) -> Self {
        Self::MalformedUrl { url: url.into() }
    }

    /// Creates an unsafe segment error.
    pub fn unsafe_segment(url: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnsafeSegment {
            url: url.into(),
            segment: segment.into(),
        }
    }

    /// Creates an empty filename error.
    pub fn empty_filename(url: impl Into<String>) -> Self {
        Self::EmptyFilename { url: url.into() }
    }
}

/// Errors raised when no free name can be found for a candidate path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeconflictError {
    /// Parent borrowing and every fallback attempt collided.
    #[error("no free name for {candidate} after {attempts} fallback attempts")]
    Exhausted {
        /// The candidate path that could not be deconflicted.
        candidate: PathBuf,
        /// Number of fallback names tried.
        attempts: usize,
    },
}
