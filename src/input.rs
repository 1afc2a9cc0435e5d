//! URL list parsing for files, stdin and argument lists.
//!
//! A URL list is plain text with one URL per line. Surrounding whitespace is
//! trimmed, and blank lines and lines starting with `#` are ignored.
//!
//! # Example
//!
//! ```
//! use urlmirror_core::input::parse_url_list;
//!
//! let urls = parse_url_list("# docs\nhttps://a.com/x\n\n  https://a.com/y  \n");
//! assert_eq!(urls, ["https://a.com/x", "https://a.com/y"]);
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Path that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

/// Errors raised while reading a URL list.
#[derive(Debug, Error)]
pub enum InputError {
    /// The list file (or stdin) could not be read.
    #[error("failed to read URL list {path}: {source}")]
    Read {
        /// The file path, or `-` for stdin.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Extracts URLs from list text, preserving order and duplicates.
#[must_use]
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Reads a URL list from a file, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns [`InputError::Read`] if the file cannot be opened or is not UTF-8.
pub fn read_url_file(path: &Path) -> Result<Vec<String>, InputError> {
    let text = if path.as_os_str() == STDIN_PATH {
        read_stdin()?
    } else {
        std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?
    };
    let urls = parse_url_list(&text);
    debug!(path = %path.display(), count = urls.len(), "read URL list");
    Ok(urls)
}

/// Reads all of stdin as a URL list source.
///
/// # Errors
///
/// Returns [`InputError::Read`] if stdin cannot be read.
pub fn read_stdin() -> Result<String, InputError> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|source| InputError::Read {
            path: PathBuf::from(STDIN_PATH),
            source,
        })?;
    Ok(buffer)
}
