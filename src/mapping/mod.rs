//! URL to local path mapping.
//!
//! This module turns URLs into local file paths in two steps:
//!
//! - [`build`] derives a deterministic candidate path from the URL and the
//!   run's [`PolicyConfig`](crate::PolicyConfig) without touching the disk
//! - [`resolve`] makes a flattened candidate unique against the filesystem
//!   and the run's [`ClaimSet`]
//!
//! # Example
//!
//! ```
//! use urlmirror_core::mapping::{ClaimSet, build, resolve};
//! use urlmirror_core::{FlattenMode, PolicyConfig};
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let policy = PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All);
//! let claims = ClaimSet::new();
//!
//! let mut finals = Vec::new();
//! for url in ["https://a.com/x/f.txt", "https://b.com/y/f.txt"] {
//!     let built = build(url, &policy).unwrap();
//!     let path = resolve(built.candidate(), built.source_segments(), &claims, policy.fallback()).unwrap();
//!     finals.push(path);
//! }
//! assert_eq!(finals[0], dir.path().join("f.txt"));
//! assert_eq!(finals[1], dir.path().join("y-f.txt"));
//! ```

mod builder;
mod claims;
mod deconflict;
mod error;
mod slug;

pub use builder::{BuiltPath, INDEX_FILENAME, build, split_extension};
pub use claims::ClaimSet;
pub use deconflict::{MAX_FALLBACK_ATTEMPTS, resolve};
pub use error::{DeconflictError, MappingError};
pub use slug::slugify;
