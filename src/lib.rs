//! urlmirror core library
//!
//! This library maps URLs to unique local file paths and downloads them,
//! mirroring the URL hierarchy on disk or flattening it with deterministic
//! conflict resolution.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`policy`] - Immutable per-run path policy
//! - [`mapping`] - URL → candidate path, and conflict resolution
//! - [`download`] - HTTP client, fetch orchestrator, run results
//! - [`input`] - URL list parsing
//! - [`user_agent`] - User-Agent strings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod input;
pub mod mapping;
pub mod policy;
pub mod user_agent;

// Re-export commonly used types
pub use download::{
    ClientOptions, DEFAULT_CONCURRENCY, DEFAULT_PER_HOST_CONCURRENCY, EngineError, ExecutionMode,
    FetchEngine, FetchResult, FetchStatus, HttpClient, RunReport, RunSummary, UrlPathMap,
};
pub use input::{parse_url_list, read_url_file};
pub use mapping::{ClaimSet, DeconflictError, MappingError, build, resolve};
pub use policy::{FallbackStyle, FlattenMode, PolicyConfig, PolicyError, SuffixPolicy};
