//! Content-Type based extension correction for suffix-less downloads.
//!
//! When the suffix policy is auto-detect, a URL like `https://a.com/docs/`
//! is saved as `index`. After the fetch, the response's media type decides
//! the extension and the file is renamed in place (`index` → `index.html`).

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::mapping::{ClaimSet, split_extension};

/// Media types that say nothing about the content.
const GENERIC_MEDIA_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Returns the bare, lowercased media type from a `Content-Type` value.
///
/// ```
/// use urlmirror_core::download::media_type;
///
/// assert_eq!(media_type("Text/HTML; charset=utf-8"), "text/html");
/// ```
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Guesses the canonical extension (with leading dot) for a media type.
///
/// Returns `None` for generic or unknown types.
#[must_use]
pub fn extension_for_media_type(content_type: &str) -> Option<&'static str> {
    let mime = media_type(content_type);
    if mime.is_empty() || GENERIC_MEDIA_TYPES.contains(&mime.as_str()) {
        return None;
    }

    let ext = match mime.as_str() {
        "text/html" => ".html",
        "application/xhtml+xml" => ".xhtml",
        "text/plain" => ".txt",
        "text/css" => ".css",
        "text/csv" => ".csv",
        "text/tab-separated-values" => ".tsv",
        "text/markdown" => ".md",
        "text/calendar" => ".ics",
        "text/javascript" | "application/javascript" => ".js",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/atom+xml" => ".atom",
        "application/rss+xml" => ".rss",
        "application/pdf" => ".pdf",
        "application/rtf" => ".rtf",
        "application/msword" => ".doc",
        "application/epub+zip" => ".epub",
        "application/zip" => ".zip",
        "application/gzip" | "application/x-gzip" => ".gz",
        "application/x-tar" => ".tar",
        "application/wasm" => ".wasm",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/svg+xml" => ".svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "font/woff" => ".woff",
        "font/woff2" => ".woff2",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        _ => return None,
    };
    Some(ext)
}

/// Renames a suffix-less file after its declared media type.
///
/// Returns the path the file lives at afterwards. The file keeps its name
/// when it already has an extension, the media type is missing, generic or
/// unknown, the target name is taken on disk or claimed in this run, or the
/// rename fails. A successful rename claims the new name.
pub async fn apply_content_type_suffix(
    path: &Path,
    content_type: Option<&str>,
    claims: &ClaimSet,
) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    let (stem, current_ext) = split_extension(name);
    if !current_ext.is_empty() {
        return path.to_path_buf();
    }
    let Some(content_type) = content_type else {
        debug!(path = %path.display(), "no Content-Type; keeping name");
        return path.to_path_buf();
    };
    let Some(ext) = extension_for_media_type(content_type) else {
        debug!(path = %path.display(), content_type, "generic or unknown media type; keeping name");
        return path.to_path_buf();
    };

    let target = path.with_file_name(format!("{stem}{ext}"));
    // Every path written in this run is claimed first, so a disk check made
    // before taking the lock cannot miss a file from this run.
    let on_disk = tokio::fs::try_exists(&target).await.unwrap_or(true);
    {
        let mut claimed = claims.lock();
        if on_disk || claimed.contains(&target) {
            warn!(
                from = %path.display(),
                to = %target.display(),
                "cannot rename based on Content-Type: target already exists"
            );
            return path.to_path_buf();
        }
        claimed.insert(target.clone());
    }

    match tokio::fs::rename(path, &target).await {
        Ok(()) => {
            info!(
                from = %name,
                to = %target.display(),
                media_type = %media_type(content_type),
                "renamed based on Content-Type"
            );
            target
        }
        Err(e) => {
            warn!(
                from = %path.display(),
                to = %target.display(),
                error = %e,
                "failed to rename based on Content-Type"
            );
            path.to_path_buf()
        }
    }
}
