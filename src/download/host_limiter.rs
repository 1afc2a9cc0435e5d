//! Per-host concurrency caps for fetch requests.
//!
//! This module provides the [`HostLimiter`] struct which bounds how many
//! fetches may be in flight against a single origin at once. Requests to
//! different hosts never wait on each other here; the global cap lives in
//! the engine.
//!
//! # Example
//!
//! ```
//! use urlmirror_core::download::HostLimiter;
//!
//! # async fn example() {
//! let limiter = HostLimiter::new(2);
//!
//! let _a = limiter.acquire("https://example.com/a").await;
//! let _b = limiter.acquire("https://example.com/b").await;
//! // A third request to example.com would now wait; other hosts proceed.
//! let _c = limiter.acquire("https://other.com/c").await;
//! # }
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument};

/// Per-host semaphore registry.
///
/// Designed to be shared across spawned Tokio tasks behind an `Arc`. It uses
/// `DashMap` for concurrent access to per-host state; the semaphore is cloned
/// out of the map before awaiting so no shard lock is held across `.await`.
#[derive(Debug)]
pub struct HostLimiter {
    per_host: usize,
    hosts: DashMap<String, Arc<Semaphore>>,
}

impl HostLimiter {
    /// Creates a limiter allowing `per_host` concurrent fetches per host.
    #[must_use]
    #[instrument]
    pub fn new(per_host: usize) -> Self {
        debug!("creating host limiter");
        Self {
            per_host: per_host.max(1),
            hosts: DashMap::new(),
        }
    }

    /// Returns the per-host cap.
    #[must_use]
    pub fn per_host(&self) -> usize {
        self.per_host
    }

    /// Waits for a slot on the URL's host. The slot is released when the
    /// returned permit is dropped.
    ///
    /// Returns `None` only if the host's semaphore was closed, which this
    /// type never does.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) -> Option<OwnedSemaphorePermit> {
        let host = extract_host(url);
        tracing::Span::current().record("host", &host);

        let semaphore = self
            .hosts
            .entry(host)
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone();

        semaphore.acquire_owned().await.ok()
    }
}

/// Extracts the host (with explicit port) used to group requests.
///
/// Returns "unknown" for malformed URLs so they still share a cap.
///
/// # Examples
///
/// ```
/// use urlmirror_core::download::extract_host;
///
/// assert_eq!(extract_host("https://Example.COM/path"), "example.com");
/// assert_eq!(extract_host("http://localhost:8080/x"), "localhost:8080");
/// assert_eq!(extract_host("not a url"), "unknown");
/// ```
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            let host = u.host_str()?.to_lowercase();
            Some(match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            })
        })
        .unwrap_or_else(|| "unknown".to_string())
}
