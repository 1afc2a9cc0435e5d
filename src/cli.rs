//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use urlmirror_core::{
    DEFAULT_CONCURRENCY, DEFAULT_PER_HOST_CONCURRENCY, ExecutionMode, FallbackStyle, FlattenMode,
    SuffixPolicy,
};

/// Download URLs into a local directory tree.
///
/// urlmirror saves each URL at a path derived from it, either mirroring the
/// URL hierarchy or flattening it with deterministic conflict resolution.
#[derive(Parser, Debug)]
#[command(name = "urlmirror")]
#[command(author, version, about)]
#[command(group(ArgGroup::new("flatten_mode").multiple(false)))]
pub struct Args {
    /// URLs to download
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read URLs from files, one per line ('-' for stdin)
    #[arg(short = 'I', long = "file", value_name = "FILE", num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Directory to save files into
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub save_dir: PathBuf,

    /// URL prefix to strip before building local paths
    #[arg(short = 'P', long, value_name = "URL")]
    pub strip_url_prefix: Option<String>,

    /// Suffix for files without one (empty string disables; default: from Content-Type)
    #[arg(long, value_name = "SUFFIX", allow_hyphen_values = true)]
    pub add_suffix: Option<String>,

    /// Skip URLs whose target file already exists
    #[arg(short = 'S', long)]
    pub skip_existing: bool,

    /// Keep query parameters in filenames
    #[arg(long)]
    pub preserve_query_params: bool,

    /// Use random hex suffixes instead of numbers when deconflicting names
    #[arg(long)]
    pub deconflict_random_suffix: bool,

    /// Download one URL at a time
    #[arg(long)]
    pub no_aio: bool,

    /// Save every file directly in the save directory
    #[arg(short = 'f', long, group = "flatten_mode")]
    pub flatten: bool,

    /// Save files under <save-dir>/<domain>/
    #[arg(short = 'F', long, group = "flatten_mode")]
    pub flatten_to_domain: bool,

    /// Keep only the first LEVEL path components
    #[arg(long, value_name = "LEVEL", group = "flatten_mode")]
    pub flatten_to_nth_path: Option<usize>,

    /// Write the URL → path map as JSON (to stdout when FILE is omitted)
    #[arg(
        short = 'j',
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "-"
    )]
    pub save_url_to_path_map_json: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Maximum concurrent downloads per host (1-100)
    #[arg(long, default_value_t = DEFAULT_PER_HOST_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub per_host: u8,

    /// Request timeout in seconds (1-3600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// User-Agent header to send (default: a desktop browser string)
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// The layout selected by the flatten flags.
    pub fn flatten_mode(&self) -> FlattenMode {
        if self.flatten {
            FlattenMode::All
        } else if self.flatten_to_domain {
            FlattenMode::ToDomain
        } else if let Some(level) = self.flatten_to_nth_path {
            FlattenMode::ToNth(level)
        } else {
            FlattenMode::Hierarchical
        }
    }

    pub fn suffix_policy(&self) -> SuffixPolicy {
        SuffixPolicy::from_option(self.add_suffix.as_deref())
    }

    pub fn fallback_style(&self) -> FallbackStyle {
        if self.deconflict_random_suffix {
            FallbackStyle::Random
        } else {
            FallbackStyle::Numeric
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.no_aio {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        }
    }
}
