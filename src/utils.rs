//! Utility functions for text cleanup, link resolution and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and HTML-to-text conversion for extracted entries
//! - Relative link resolution against the page a link was found on
//! - String truncation for logging
//! - Timestamps used in output file names
//! - File system validation for output directories

use chrono::{DateTime, Local};
use scraper::Html;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  a \n\t b "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup from an HTML fragment, keeping only its text.
///
/// Feed summaries are frequently HTML; matching keywords against the raw markup
/// would hit attribute values and tag names.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') {
        return collapse_whitespace(html);
    }
    let fragment = Html::parse_fragment(html);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Resolve `href` against `base`, keeping only http(s) targets.
///
/// Fragments are dropped so `/story#comments` and `/story` collapse to the
/// same link. Returns `None` for empty, fragment-only, `mailto:`,
/// `javascript:` and unparseable hrefs.
///
/// # Examples
///
/// ```ignore
/// let base = Url::parse("https://example.com/news").unwrap();
/// assert_eq!(resolve_link(&base, "/story/1").unwrap(), "https://example.com/story/1");
/// ```
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backed off to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Timestamp fragment used in output file names, e.g. `2024-12-22_09-15-00`.
pub fn file_timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::File::create(&probe_path).await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}
