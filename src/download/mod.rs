//! HTTP fetching and run orchestration.
//!
//! This module takes a batch of URLs, maps each to a unique local path, and
//! streams the bodies to disk.
//!
//! # Features
//!
//! - Streaming downloads through a fixed-size write buffer
//! - Deterministic path planning in input order, fetches in parallel
//! - Global and per-host concurrency caps
//! - Extension correction from the response `Content-Type`
//! - Per-URL outcomes plus a URL → path map and run summary
//!
//! # Example
//!
//! ```no_run
//! use urlmirror_core::download::{FetchEngine, HttpClient};
//! use urlmirror_core::PolicyConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = FetchEngine::new(PolicyConfig::new("./mirror"), HttpClient::new(), 10, 5)?;
//! let report = engine
//!     .run(&["https://example.com/paper.pdf".to_string()])
//!     .await?;
//! report.map.write_json(std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod host_limiter;
mod outcome;
mod suffix;

pub use client::{ClientOptions, FetchedFile, HttpClient};
pub use constants::{
    DEFAULT_CONCURRENCY, DEFAULT_PER_HOST_CONCURRENCY, DOWNLOAD_CHUNK_SIZE, REQUEST_TIMEOUT,
};
pub use engine::{EngineError, ExecutionMode, FetchEngine};
pub use error::{DownloadError, FetchFailure};
pub use host_limiter::{HostLimiter, extract_host};
pub use outcome::{FetchResult, FetchStatus, RunReport, RunSummary, UrlPathMap};
pub use suffix::{apply_content_type_suffix, extension_for_media_type, media_type};

// Note: no module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
