//! Per-URL results and run-level aggregates.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::FetchFailure;

/// Terminal state of one URL within a run.
#[derive(Debug)]
pub enum FetchStatus {
    /// Fetched and written to this path (after any Content-Type rename).
    Success(PathBuf),
    /// A file already existed at the candidate path; nothing was fetched.
    Skipped(PathBuf),
    /// No local file was produced.
    Failed(FetchFailure),
}

/// Outcome for one input URL.
#[derive(Debug)]
pub struct FetchResult {
    /// The URL exactly as supplied.
    pub url: String,
    /// What happened to it.
    pub status: FetchStatus,
}

impl FetchResult {
    #[must_use]
    pub fn success(url: impl Into<String>, path: PathBuf) -> Self {
        Self {
            url: url.into(),
            status: FetchStatus::Success(path),
        }
    }

    #[must_use]
    pub fn skipped(url: impl Into<String>, path: PathBuf) -> Self {
        Self {
            url: url.into(),
            status: FetchStatus::Skipped(path),
        }
    }

    #[must_use]
    pub fn failed(url: impl Into<String>, failure: impl Into<FetchFailure>) -> Self {
        Self {
            url: url.into(),
            status: FetchStatus::Failed(failure.into()),
        }
    }

    /// The local path for successes and skips.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.status {
            FetchStatus::Success(path) | FetchStatus::Skipped(path) => Some(path),
            FetchStatus::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Success(_))
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, FetchStatus::Skipped(_))
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, FetchStatus::Failed(_))
    }
}

/// URL → absolute local path for every URL that has a file on disk.
///
/// Backed by a `BTreeMap`, so iteration and JSON output are sorted by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UrlPathMap(BTreeMap<String, String>);

impl UrlPathMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` at `path`, stored as an absolute path string.
    pub fn insert(&mut self, url: impl Into<String>, path: &Path) {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.0
            .insert(url.into(), absolute.to_string_lossy().into_owned());
    }

    /// Looks up a URL by exact string match.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&str> {
        self.0.get(url).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Writes the map as a pretty-printed JSON object followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Success, skip and failure counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Tallies a slice of results.
    #[must_use]
    pub fn from_results(results: &[FetchResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                FetchStatus::Success(_) => acc.succeeded += 1,
                FetchStatus::Skipped(_) => acc.skipped += 1,
                FetchStatus::Failed(_) => acc.failed += 1,
            }
            acc
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// True when any URL failed; callers should exit non-zero.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed > 0
    }
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One result per input URL, in input order.
    pub results: Vec<FetchResult>,
    /// Paths for successful and skipped URLs.
    pub map: UrlPathMap,
    pub summary: RunSummary,
}

impl RunReport {
    /// Builds the map and summary from ordered results.
    #[must_use]
    pub fn from_results(results: Vec<FetchResult>) -> Self {
        let mut map = UrlPathMap::new();
        for result in &results {
            if let Some(path) = result.path() {
                map.insert(result.url.as_str(), path);
            }
        }
        let summary = RunSummary::from_results(&results);
        Self {
            results,
            map,
            summary,
        }
    }
}
