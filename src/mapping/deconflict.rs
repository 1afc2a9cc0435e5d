//! Collision resolution for flattened candidate paths.
//!
//! Resolution runs in two bounded phases:
//!
//! 1. **Parent borrowing** - prepend URL directory segments (nearest parent
//!    first) to the original stem and slug the result: `f.txt` becomes
//!    `y-f.txt`, then `x-y-f.txt`.
//! 2. **Fallback suffixes** - once the segments run out, append `_1`, `_2`,
//!    ... or a random `_3fa9c1` token to the current stem, at most
//!    [`MAX_FALLBACK_ATTEMPTS`] times.
//!
//! The winning path is claimed before the claim set lock is released.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, info, warn};

use super::builder::split_extension;
use super::claims::{ClaimSet, is_taken};
use super::error::DeconflictError;
use super::slug::slugify;
use crate::policy::FallbackStyle;

/// Maximum number of fallback names tried before giving up.
pub const MAX_FALLBACK_ATTEMPTS: usize = 100;

/// Upper bound (exclusive) for six-hex-digit random tokens.
const RANDOM_TOKEN_SPACE: u32 = 0x0100_0000;

/// Resolves `candidate` to a path that is neither on disk nor claimed, and
/// claims it.
///
/// `source_segments` are the URL's decoded directory segments; they are
/// consumed from the end.
///
/// # Errors
///
/// Returns [`DeconflictError::Exhausted`] if every fallback name collides.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use urlmirror_core::mapping::{ClaimSet, resolve};
/// use urlmirror_core::FallbackStyle;
///
/// let dir = tempfile::TempDir::new().unwrap();
/// let candidate = dir.path().join("f.txt");
/// let claims = ClaimSet::new();
/// let segments = vec!["x".to_string()];
///
/// let first = resolve(&candidate, &segments, &claims, FallbackStyle::Numeric).unwrap();
/// let second = resolve(&candidate, &segments, &claims, FallbackStyle::Numeric).unwrap();
/// assert_eq!(first, candidate);
/// assert_eq!(second, dir.path().join("x-f.txt"));
/// ```
pub fn resolve(
    candidate: &Path,
    source_segments: &[String],
    claims: &ClaimSet,
    style: FallbackStyle,
) -> Result<PathBuf, DeconflictError> {
    let mut claimed = claims.lock();

    let resolved = match borrow_parents(candidate, source_segments, &claimed) {
        Some(path) => path,
        None => fallback(candidate, source_segments, &claimed, style)?,
    };

    if resolved != candidate {
        info!(
            original = %candidate.display(),
            resolved = %resolved.display(),
            "candidate path conflicted; using deconflicted name"
        );
    }
    claimed.insert(resolved.clone());
    Ok(resolved)
}

/// Phase 1: returns the first free path among the candidate itself and its
/// parent-borrowing variants, or `None` if all of them are taken.
fn borrow_parents(
    candidate: &Path,
    segments: &[String],
    claimed: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    if !is_taken(candidate, claimed) {
        return Some(candidate.to_path_buf());
    }
    (1..=segments.len())
        .map(|borrowed| borrowed_name(candidate, segments, borrowed))
        .inspect(|path| debug!(path = %path.display(), "probing parent-segment name"))
        .find(|path| !is_taken(path, claimed))
}

/// Phase 2: suffixes the stem of the last borrowed name tried.
fn fallback(
    candidate: &Path,
    segments: &[String],
    claimed: &HashSet<PathBuf>,
    style: FallbackStyle,
) -> Result<PathBuf, DeconflictError> {
    let last_tried = if segments.is_empty() {
        candidate.to_path_buf()
    } else {
        borrowed_name(candidate, segments, segments.len())
    };
    let (_, original_ext) = split_parts(candidate);
    let (stem, _) = split_parts(&last_tried);
    let dir = parent_dir(candidate);

    let mut rng = rand::thread_rng();
    for attempt in 1..=MAX_FALLBACK_ATTEMPTS {
        let token = match style {
            FallbackStyle::Numeric => attempt.to_string(),
            FallbackStyle::Random => format!("{:06x}", rng.gen_range(0..RANDOM_TOKEN_SPACE)),
        };
        let path = dir.join(format!("{stem}_{token}{original_ext}"));
        if !is_taken(&path, claimed) {
            warn!(
                original = %candidate.display(),
                resolved = %path.display(),
                ?style,
                "parent segments exhausted; deconflicted with fallback suffix"
            );
            return Ok(path);
        }
    }

    Err(DeconflictError::Exhausted {
        candidate: candidate.to_path_buf(),
        attempts: MAX_FALLBACK_ATTEMPTS,
    })
}

/// `{dir}/{slug(last `borrowed` segments + original stem)}{ext}`.
fn borrowed_name(candidate: &Path, segments: &[String], borrowed: usize) -> PathBuf {
    let (stem, ext) = split_parts(candidate);
    let joined = segments[segments.len() - borrowed..]
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(stem.as_str()))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    parent_dir(candidate).join(format!("{}{ext}", slugify(&joined)))
}

fn split_parts(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_extension(&name);
    (stem.to_string(), ext.to_string())
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}
