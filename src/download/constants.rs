//! Constants for the download module (timeouts, buffer sizes, pool limits).

use std::time::Duration;

/// Overall per-request timeout, covering connect, headers and body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Write buffer size used when streaming a response body to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// Default cap on fetches in flight across all hosts.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default cap on fetches in flight against a single host.
pub const DEFAULT_PER_HOST_CONCURRENCY: usize = 5;
