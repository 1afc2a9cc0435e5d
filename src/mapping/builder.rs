//! URL to candidate local path derivation.
//!
//! [`build`] is pure: the same URL and [`PolicyConfig`] always produce the same
//! [`BuiltPath`]. Nothing here touches the filesystem.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use url::Url;

use super::error::MappingError;
use super::slug::slugify;
use crate::policy::{FlattenMode, PolicyConfig, SuffixPolicy};

/// Filename used for directory-like URLs.
pub const INDEX_FILENAME: &str = "index";

/// Candidate path and deconfliction material derived from one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPath {
    candidate: PathBuf,
    source_segments: Vec<String>,
    prefix_matched: bool,
}

impl BuiltPath {
    /// The local path before any deconfliction.
    #[must_use]
    pub fn candidate(&self) -> &Path {
        &self.candidate
    }

    /// Decoded URL directory segments (after prefix stripping), nearest
    /// parent last. Independent of the flatten mode.
    #[must_use]
    pub fn source_segments(&self) -> &[String] {
        &self.source_segments
    }

    /// Whether a configured strip-prefix applied to this URL. Always true
    /// when no prefix is configured.
    #[must_use]
    pub fn prefix_matched(&self) -> bool {
        self.prefix_matched
    }

    #[must_use]
    pub fn into_parts(self) -> (PathBuf, Vec<String>) {
        (self.candidate, self.source_segments)
    }
}

/// Maps a URL to its candidate local path under `policy`.
///
/// # Errors
///
/// - [`MappingError::MalformedUrl`] if the URL lacks a scheme or host
/// - [`MappingError::UnsafeSegment`] if a decoded segment is `.`/`..` or
///   contains a path separator
/// - [`MappingError::EmptyFilename`] if no filename remains after policy
///   application
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use urlmirror_core::mapping::build;
/// use urlmirror_core::PolicyConfig;
///
/// let policy = PolicyConfig::new("out");
/// let built = build("https://a.com/docs/guide.html", &policy).unwrap();
/// assert_eq!(built.candidate(), Path::new("out/a.com/docs/guide.html"));
/// assert_eq!(built.source_segments(), ["docs"]);
/// ```
pub fn build(url: &str, policy: &PolicyConfig) -> Result<BuiltPath, MappingError> {
    let parsed = Url::parse(url).map_err(|_| MappingError::malformed_url(url))?;
    let Some(netloc) = network_location(&parsed) else {
        return Err(MappingError::malformed_url(url));
    };

    let original_path = parsed.path();
    let (working_path, prefix_matched) = match policy.strip_prefix() {
        Some(prefix) => match strip_url_prefix(&parsed, prefix) {
            Some(rest) => {
                debug!(prefix = %prefix, remainder = rest, "stripped URL prefix");
                (rest, true)
            }
            None => {
                warn!(
                    url,
                    prefix = %prefix,
                    "URL does not match strip prefix; using full path from domain"
                );
                (original_path, false)
            }
        },
        None => (original_path, true),
    };

    let segments = decode_segments(working_path);
    if let Some(bad) = segments.iter().find(|s| !is_safe_segment(s)) {
        return Err(MappingError::unsafe_segment(url, bad.as_str()));
    }

    let dir_like = original_path.ends_with('/') || segments.is_empty();
    let (tentative, source_segments) = if dir_like {
        ("", segments.as_slice())
    } else {
        let (last, rest) = segments.split_last().map_or(("", &[][..]), |(l, r)| (l.as_str(), r));
        (last, rest)
    };

    let mut filename = apply_suffix_policy(tentative, dir_like, policy.suffix());

    if policy.preserve_query()
        && let Some(query) = parsed.query().filter(|q| !q.is_empty())
    {
        let (stem, ext) = split_extension(&filename);
        filename = format!("{stem}_query_{}{ext}", slugify(query));
        debug!(filename = %filename, "preserved query parameters in filename");
    }

    if filename.is_empty() {
        return Err(MappingError::empty_filename(url));
    }

    let dirs: Vec<&str> = match policy.flatten() {
        FlattenMode::All => Vec::new(),
        FlattenMode::ToDomain => vec![netloc.as_str()],
        FlattenMode::ToNth(levels) => source_segments
            .iter()
            .take(levels)
            .map(String::as_str)
            .collect(),
        FlattenMode::Hierarchical => {
            let host_first = policy.strip_prefix().is_none() || !prefix_matched;
            host_first
                .then_some(netloc.as_str())
                .into_iter()
                .chain(source_segments.iter().map(String::as_str))
                .collect()
        }
    };

    let mut candidate = policy.base_dir().to_path_buf();
    candidate.extend(dirs);
    candidate.push(&filename);
    debug!(url, candidate = %candidate.display(), "calculated candidate path");

    Ok(BuiltPath {
        candidate,
        source_segments: source_segments.to_vec(),
        prefix_matched,
    })
}

/// Splits a filename into stem and extension (extension keeps its dot).
///
/// Leading dots never start an extension, so `.bashrc` has none.
///
/// ```
/// use urlmirror_core::mapping::split_extension;
///
/// assert_eq!(split_extension("f.tar.gz"), ("f.tar", ".gz"));
/// assert_eq!(split_extension("index"), ("index", ""));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}

/// Host plus explicit port, the directory name used for a URL's origin.
///
/// The scheme's default port and any userinfo never appear: `url` drops a
/// default port while parsing, and credentials do not belong in paths.
fn network_location(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Returns the path remainder after `prefix`, or `None` when it does not apply.
///
/// A path that equals the prefix path up to one trailing slash yields an
/// empty remainder.
fn strip_url_prefix<'a>(url: &'a Url, prefix: &Url) -> Option<&'a str> {
    if url.scheme() != prefix.scheme() || network_location(url) != network_location(prefix) {
        return None;
    }
    let path = url.path();
    let prefix_path = prefix.path();
    if let Some(rest) = path.strip_prefix(prefix_path) {
        return Some(rest);
    }
    let trailing_slash_only = prefix_path.len() == path.len() + 1
        && prefix_path.ends_with('/')
        && prefix_path.starts_with(path);
    trailing_slash_only.then_some("")
}

fn decode_segments(path: &str) -> Vec<String> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            urlencoding::decode(segment).map_or_else(
                |e| {
                    debug!(segment, error = %e, "URL decoding failed, using raw segment");
                    segment.to_string()
                },
                Cow::into_owned,
            )
        })
        .collect()
}

fn is_safe_segment(segment: &str) -> bool {
    !matches!(segment, "." | "..") && !segment.contains(['/', '\\', '\0'])
}

fn apply_suffix_policy(tentative: &str, dir_like: bool, policy: &SuffixPolicy) -> String {
    let index_like = dir_like || tentative.is_empty();
    match policy {
        SuffixPolicy::Auto if index_like => INDEX_FILENAME.to_string(),
        SuffixPolicy::Auto => tentative.to_string(),
        SuffixPolicy::None if index_like => INDEX_FILENAME.to_string(),
        SuffixPolicy::None => split_extension(tentative).0.to_string(),
        SuffixPolicy::Literal(suffix) if index_like => format!("{INDEX_FILENAME}{suffix}"),
        SuffixPolicy::Literal(suffix) if !tentative.contains('.') => format!("{tentative}{suffix}"),
        SuffixPolicy::Literal(_) => tentative.to_string(),
    }
}
