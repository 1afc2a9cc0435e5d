//! Fetch orchestrator: drives a batch of URLs from path planning to disk.
//!
//! This module provides the `FetchEngine` which maps each URL to a unique
//! local path and then fetches the bodies, either one at a time or
//! concurrently under a global cap and a per-host cap.
//!
//! # Overview
//!
//! For every URL, in input order, the engine:
//!
//! 1. Builds the candidate path ([`crate::mapping::build`])
//! 2. Skips it if skip-existing is on and a file not claimed by this run is
//!    already there (the skipped path is claimed)
//! 3. Deconflicts it against disk and the run's [`ClaimSet`] (flattening
//!    modes) or fails it if the path is already claimed (hierarchical mode),
//!    and claims the final path
//! 4. Rejects targets that are directories or whose parent is a file
//! 5. Fetches the body (inline when sequential, in a spawned task otherwise)
//! 6. Renames suffix-less files from the response `Content-Type` (auto
//!    suffix policy only)
//!
//! Steps 1-4 run on the driver, so path decisions are serialized and
//! deterministic; only step 5 and 6 run in parallel.
//!
//! # Example
//!
//! ```no_run
//! use urlmirror_core::download::{FetchEngine, HttpClient};
//! use urlmirror_core::{FlattenMode, PolicyConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = PolicyConfig::new("./mirror").with_flatten(FlattenMode::ToDomain);
//! let engine = FetchEngine::new(policy, HttpClient::new(), 10, 5)?;
//! let urls = vec!["https://example.com/docs/".to_string()];
//! let report = engine.run(&urls).await?;
//! println!(
//!     "ok: {}, skipped: {}, failed: {}",
//!     report.summary.succeeded, report.summary.skipped, report.summary.failed
//! );
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use super::client::HttpClient;
use super::error::{DownloadError, FetchFailure};
use super::host_limiter::HostLimiter;
use super::outcome::{FetchResult, RunReport};
use super::suffix::apply_content_type_suffix;
use crate::mapping::{ClaimSet, build, resolve};
use crate::policy::{PolicyConfig, SuffixPolicy};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Error type for orchestration-level faults that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid global concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Invalid per-host concurrency value provided.
    #[error(
        "invalid per-host concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidPerHostConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The base directory could not be created.
    #[error("failed to create base directory {path}: {source}")]
    BaseDirectory {
        /// The base directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Whether fetches run one at a time or in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One fetch at a time, in input order.
    Sequential,
    /// Spawned fetches bounded by the global and per-host caps.
    #[default]
    Concurrent,
}

/// Orchestrates path planning and fetching for a batch of URLs.
///
/// # Concurrency Model
///
/// - Path planning and claiming happen on the calling task, in input order
/// - In concurrent mode each fetch runs in its own Tokio task
/// - A task first waits for a per-host slot, then for a global slot
/// - Permits are released automatically when the fetch finishes (RAII)
/// - Failures are terminal for their URL and never abort the batch
///
/// Dropping the `run` future (e.g. on Ctrl-C) abandons the run; fetches
/// already spawned are not awaited.
#[derive(Debug)]
pub struct FetchEngine {
    policy: Arc<PolicyConfig>,
    client: HttpClient,
    mode: ExecutionMode,
    concurrency: usize,
    semaphore: Arc<Semaphore>,
    host_limiter: Arc<HostLimiter>,
}

/// What planning decided for one URL.
enum Plan {
    /// Finished without a fetch (skipped or failed).
    Done(FetchResult),
    /// Fetch into this claimed path.
    Fetch(PathBuf),
}

impl FetchEngine {
    /// Creates an engine in concurrent mode.
    ///
    /// # Arguments
    ///
    /// * `policy` - Path policy for the run
    /// * `client` - HTTP client shared by all fetches
    /// * `concurrency` - Maximum fetches in flight overall (1-100)
    /// * `per_host` - Maximum fetches in flight per host (1-100)
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] or
    /// [`EngineError::InvalidPerHostConcurrency`] if a cap is out of range.
    #[instrument(level = "debug", skip(policy, client))]
    pub fn new(
        policy: PolicyConfig,
        client: HttpClient,
        concurrency: usize,
        per_host: usize,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&per_host) {
            return Err(EngineError::InvalidPerHostConcurrency { value: per_host });
        }

        debug!(
            concurrency,
            per_host,
            base_dir = %policy.base_dir().display(),
            flatten = %policy.flatten(),
            suffix = %policy.suffix(),
            "creating fetch engine"
        );

        Ok(Self {
            policy: Arc::new(policy),
            client,
            mode: ExecutionMode::default(),
            concurrency,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            host_limiter: Arc::new(HostLimiter::new(per_host)),
        })
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Returns the configured global concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured per-host concurrency limit.
    #[must_use]
    pub fn per_host(&self) -> usize {
        self.host_limiter.per_host()
    }

    #[must_use]
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Processes every URL and returns per-URL results in input order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BaseDirectory`] if the base directory cannot
    /// be created; nothing is fetched in that case.
    ///
    /// Note: Individual URL failures do NOT cause this method to error.
    /// They are recorded in the report and counted in its summary.
    #[instrument(skip(self, urls), fields(urls = urls.len(), base_dir = %self.policy.base_dir().display()))]
    pub async fn run(&self, urls: &[String]) -> Result<RunReport, EngineError> {
        let base_dir = self.policy.base_dir();
        tokio::fs::create_dir_all(base_dir)
            .await
            .map_err(|source| EngineError::BaseDirectory {
                path: base_dir.to_path_buf(),
                source,
            })?;

        info!(mode = ?self.mode, "starting run");

        let claims = Arc::new(ClaimSet::new());
        let mut slots: Vec<Option<FetchResult>> = Vec::with_capacity(urls.len());
        let mut handles = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            let path = match self.plan(url, &claims) {
                Plan::Done(result) => {
                    slots.push(Some(result));
                    continue;
                }
                Plan::Fetch(path) => path,
            };

            match self.mode {
                ExecutionMode::Sequential => {
                    let result = fetch_one(&self.client, &self.policy, &claims, url, path).await;
                    slots.push(Some(result));
                }
                ExecutionMode::Concurrent => {
                    slots.push(None);

                    let client = self.client.clone();
                    let policy = Arc::clone(&self.policy);
                    let claims = Arc::clone(&claims);
                    let semaphore = Arc::clone(&self.semaphore);
                    let host_limiter = Arc::clone(&self.host_limiter);
                    let task_url = url.clone();

                    handles.push((
                        index,
                        url.clone(),
                        tokio::spawn(async move {
                            // Permits are dropped when this block exits (RAII)
                            let _host_permit = host_limiter.acquire(&task_url).await;
                            let _permit = semaphore.acquire_owned().await;
                            fetch_one(&client, &policy, &claims, &task_url, path).await
                        }),
                    ));
                }
            }
        }

        debug!(task_count = handles.len(), "waiting for fetches to complete");

        for (index, url, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                warn!(url = %url, error = %e, "fetch task panicked");
                FetchResult::failed(
                    url,
                    FetchFailure::TaskAborted {
                        message: e.to_string(),
                    },
                )
            });
            slots[index] = Some(result);
        }

        let report = RunReport::from_results(slots.into_iter().flatten().collect());
        info!(
            succeeded = report.summary.succeeded,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            total = report.summary.total(),
            claimed = claims.len(),
            "run complete"
        );
        Ok(report)
    }

    /// Decides where a URL goes, claiming the path. Never touches the network.
    fn plan(&self, url: &str, claims: &ClaimSet) -> Plan {
        let policy = &*self.policy;

        let built = match build(url, policy) {
            Ok(built) => built,
            Err(e) => return fail(url, e),
        };

        if policy.skip_existing() {
            let candidate = built.candidate();
            if candidate.is_dir() {
                return fail(
                    url,
                    FetchFailure::TargetIsDirectory {
                        path: candidate.to_path_buf(),
                    },
                );
            }
            // A file claimed earlier in this run is not pre-existing; such a
            // URL falls through to deconfliction or a claim conflict.
            let skipped = {
                let mut claimed = claims.lock();
                let skip = !claimed.contains(candidate) && candidate.exists();
                if skip {
                    claimed.insert(candidate.to_path_buf());
                }
                skip
            };
            if skipped {
                info!(url, path = %candidate.display(), "target already exists; skipping");
                return Plan::Done(FetchResult::skipped(url, candidate.to_path_buf()));
            }
        }

        let (candidate, segments) = built.into_parts();
        let final_path = if policy.flatten().is_flattening() {
            match resolve(&candidate, &segments, claims, policy.fallback()) {
                Ok(path) => path,
                Err(e) => return fail(url, e),
            }
        } else {
            if !claims.claim(candidate.clone()) {
                return fail(url, FetchFailure::PathAlreadyClaimed { path: candidate });
            }
            candidate
        };

        if final_path.is_dir() {
            return fail(url, FetchFailure::TargetIsDirectory { path: final_path });
        }
        if let Some(parent) = non_empty_parent(&final_path)
            && parent.exists()
            && !parent.is_dir()
        {
            return fail(
                url,
                FetchFailure::ParentNotDirectory {
                    path: parent.to_path_buf(),
                },
            );
        }

        debug!(url, path = %final_path.display(), "planned fetch");
        Plan::Fetch(final_path)
    }
}

fn fail(url: &str, failure: impl Into<FetchFailure>) -> Plan {
    let failure = failure.into();
    error!(url, error = %failure, "skipping URL");
    Plan::Done(FetchResult::failed(url, failure))
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Fetches one planned URL and applies the Content-Type suffix rule.
#[instrument(skip(client, policy, claims, path), fields(url = %url))]
async fn fetch_one(
    client: &HttpClient,
    policy: &PolicyConfig,
    claims: &ClaimSet,
    url: &str,
    path: PathBuf,
) -> FetchResult {
    if let Some(parent) = non_empty_parent(&path)
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        let e = DownloadError::io(parent, e);
        warn!(error = %e, "failed to create parent directory");
        return FetchResult::failed(url, e);
    }

    match client.fetch_to_path(url, &path).await {
        Ok(fetched) => {
            let final_path = if matches!(policy.suffix(), SuffixPolicy::Auto) {
                apply_content_type_suffix(&fetched.path, fetched.content_type.as_deref(), claims)
                    .await
            } else {
                fetched.path
            };
            info!(path = %final_path.display(), bytes = fetched.bytes, "download completed");
            FetchResult::success(url, final_path)
        }
        Err(e) => {
            warn!(error = %e, "download failed");
            FetchResult::failed(url, e)
        }
    }
}
