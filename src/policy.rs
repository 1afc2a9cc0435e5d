//! Path policy configuration shared by every stage of a run.
//!
//! A [`PolicyConfig`] is built once (usually from CLI arguments) and then
//! passed by reference into the path builder, the deconfliction engine and the
//! fetch orchestrator. It never changes during a run.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

/// How the local filename's extension is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SuffixPolicy {
    /// Keep the URL's filename; a suffix-less file may be renamed later from
    /// the response `Content-Type`.
    #[default]
    Auto,
    /// Never add an extension, and strip the one the URL carries.
    None,
    /// Append this suffix (always starts with `.`) to names that have none.
    Literal(String),
}

impl SuffixPolicy {
    /// Builds a policy from the raw `--add-suffix` value.
    ///
    /// `None` means auto-detect, an empty string disables suffixes, and any
    /// other value is used literally. A missing leading dot is prepended.
    #[must_use]
    pub fn from_option(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Auto,
            Some("") => Self::None,
            Some(suffix) if suffix.starts_with('.') => Self::Literal(suffix.to_string()),
            Some(suffix) => {
                warn!(suffix, "suffix does not start with '.'; prepending '.'");
                Self::Literal(format!(".{suffix}"))
            }
        }
    }
}

impl fmt::Display for SuffixPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto (Content-Type)"),
            Self::None => write!(f, "none"),
            Self::Literal(suffix) => write!(f, "literal '{suffix}'"),
        }
    }
}

/// How much of the URL's directory structure is reproduced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlattenMode {
    /// `base/host/seg1/.../file`, or `base/seg.../file` after a matched prefix.
    #[default]
    Hierarchical,
    /// Everything directly under the base directory.
    All,
    /// `base/host/file`.
    ToDomain,
    /// `base/seg1/.../segN/file`; `ToNth(0)` behaves like [`FlattenMode::All`].
    ToNth(usize),
}

impl FlattenMode {
    /// Returns true for every mode that may map distinct URLs onto one path.
    #[must_use]
    pub fn is_flattening(self) -> bool {
        !matches!(self, Self::Hierarchical)
    }
}

impl fmt::Display for FlattenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hierarchical => write!(f, "hierarchical"),
            Self::All | Self::ToNth(0) => write!(f, "flatten all"),
            Self::ToDomain => write!(f, "flatten to domain"),
            Self::ToNth(n) => write!(f, "flatten to {n} path component(s)"),
        }
    }
}

/// Name generator used once parent-segment borrowing is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStyle {
    /// `stem_1`, `stem_2`, ...
    #[default]
    Numeric,
    /// `stem_3fa9c1` (six hex characters).
    Random,
}

/// Errors raised while assembling a [`PolicyConfig`].
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The strip-prefix value is not an absolute URL with a host.
    #[error("invalid strip-prefix URL: {value}")]
    InvalidStripPrefix {
        /// The rejected value.
        value: String,
    },
}

/// Immutable path policy for one run.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    base_dir: PathBuf,
    strip_prefix: Option<Url>,
    suffix: SuffixPolicy,
    flatten: FlattenMode,
    preserve_query: bool,
    skip_existing: bool,
    fallback: FallbackStyle,
}

impl PolicyConfig {
    /// Creates a policy with defaults: hierarchical layout, auto suffix,
    /// numeric fallback, no prefix stripping.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            strip_prefix: None,
            suffix: SuffixPolicy::default(),
            flatten: FlattenMode::default(),
            preserve_query: false,
            skip_existing: false,
            fallback: FallbackStyle::default(),
        }
    }

    /// Sets the URL prefix removed before mirroring the path.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidStripPrefix`] if `prefix` does not parse
    /// as a URL with a host.
    pub fn with_strip_prefix(mut self, prefix: &str) -> Result<Self, PolicyError> {
        let parsed = Url::parse(prefix)
            .ok()
            .filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
            .ok_or_else(|| PolicyError::InvalidStripPrefix {
                value: prefix.to_string(),
            })?;
        self.strip_prefix = Some(parsed);
        Ok(self)
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: SuffixPolicy) -> Self {
        self.suffix = suffix;
        self
    }

    #[must_use]
    pub fn with_flatten(mut self, flatten: FlattenMode) -> Self {
        self.flatten = flatten;
        self
    }

    #[must_use]
    pub fn with_preserve_query(mut self, preserve_query: bool) -> Self {
        self.preserve_query = preserve_query;
        self
    }

    #[must_use]
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackStyle) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn strip_prefix(&self) -> Option<&Url> {
        self.strip_prefix.as_ref()
    }

    #[must_use]
    pub fn suffix(&self) -> &SuffixPolicy {
        &self.suffix
    }

    #[must_use]
    pub fn flatten(&self) -> FlattenMode {
        self.flatten
    }

    #[must_use]
    pub fn preserve_query(&self) -> bool {
        self.preserve_query
    }

    #[must_use]
    pub fn skip_existing(&self) -> bool {
        self.skip_existing
    }

    #[must_use]
    pub fn fallback(&self) -> FallbackStyle {
        self.fallback
    }
}
