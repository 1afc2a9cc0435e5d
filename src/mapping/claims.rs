//! In-run registry of final paths already assigned to URLs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Final paths claimed by URLs during one run.
///
/// The set only grows. A claimed path may not exist on disk yet (its fetch
/// can still be in flight), so conflict checks consult both this set and the
/// filesystem. Share it behind an `Arc`; every check-then-claim sequence must
/// happen under one [`ClaimSet::lock`] so concurrent callers never pick the
/// same name.
#[derive(Debug, Default)]
pub struct ClaimSet {
    paths: Mutex<HashSet<PathBuf>>,
}

impl ClaimSet {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `path` is already claimed.
    #[must_use]
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    /// Claims `path`, returning false if it was already claimed.
    pub fn claim(&self, path: impl Into<PathBuf>) -> bool {
        self.lock().insert(path.into())
    }

    /// Number of claimed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the set for a compound check-and-claim.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // Poisoning is ignored: inserts are atomic.
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns true if `path` is taken on disk or in `claimed`.
///
/// Stats the filesystem while the caller holds the claim lock. Only path
/// planning calls this; spawned fetch tasks check the disk with `tokio::fs`
/// before locking.
pub(crate) fn is_taken(path: &Path, claimed: &HashSet<PathBuf>) -> bool {
    path.exists() || claimed.contains(path)
}
