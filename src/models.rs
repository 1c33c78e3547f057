//! Data models shared by every stage of the pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: a single entry extracted from a feed or page
//! - [`Source`]: a configured feed or web page to read from
//! - [`SourceReport`]: the typed outcome of reading one source
//! - [`FetchFailure`]: one row of the error log

use crate::errors::FetchError;
use chrono::{DateTime, Local};
use url::Url;

/// Title used when no headline could be extracted from an entry.
pub const NO_TITLE: &str = "No Title Found";

/// Title of the rows appended when the quota cannot be met from real articles.
pub const PLACEHOLDER_TITLE: &str = "Placeholder Article";

/// Source name of placeholder rows.
pub const PLACEHOLDER_SOURCE: &str = "Unknown";

/// A news entry as extracted from a source.
///
/// Created by the source reader, annotated by the keyword filter and written
/// exactly once by the CSV writer. The `summary` is only used for matching and
/// is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Article {
    /// The headline, or [`NO_TITLE`] when extraction failed.
    pub title: String,
    /// Absolute URL of the article. Empty only for placeholder rows.
    pub link: String,
    /// Label of the feed or site the article came from.
    pub source: String,
    /// Keywords that matched, in the order they were checked.
    pub matched_keywords: Vec<String>,
    /// Optional summary or body text used for keyword matching.
    pub summary: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>, source: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            NO_TITLE.to_string()
        } else {
            title
        };
        Self {
            title,
            link: link.into(),
            source: source.into(),
            matched_keywords: Vec::new(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self
    }

    /// A filler row used when neither filtered nor pool articles can meet the quota.
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER_TITLE.to_string(),
            link: String::new(),
            source: PLACEHOLDER_SOURCE.to_string(),
            matched_keywords: Vec::new(),
            summary: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.link.is_empty() && self.title == PLACEHOLDER_TITLE
    }

    /// The value two articles are compared by when deduplicating.
    pub fn dedup_key(&self) -> &str {
        &self.link
    }

    /// Host of the article link with any leading `www.` removed.
    pub fn host(&self) -> Option<String> {
        host_label(&self.link)
    }
}

/// How entries are extracted from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// RSS or Atom syndication feed.
    Feed,
    /// HTML page scraped for article links.
    Page,
}

/// A configured feed URL or web page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub label: String,
    pub url: String,
    pub kind: SourceKind,
}

impl Source {
    /// Build a source, deriving the label from the URL host when none is given.
    pub fn new(label: Option<String>, url: impl Into<String>, kind: SourceKind) -> Self {
        let url = url.into();
        let label = label
            .filter(|l| !l.trim().is_empty())
            .or_else(|| host_label(&url))
            .unwrap_or_else(|| url.clone());
        Self { label, url, kind }
    }
}

/// Outcome of reading a single source.
///
/// Keeps "fetched fine but nothing in it" (`Ok(vec![])`) apart from "could not
/// be fetched" (`Err`).
#[derive(Debug)]
pub struct SourceReport {
    pub source: Source,
    pub outcome: Result<Vec<Article>, FetchError>,
}

impl SourceReport {
    pub fn article_count(&self) -> usize {
        self.outcome.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// One row of the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub timestamp: DateTime<Local>,
    pub url: String,
    pub error: String,
}

/// Extract the host of a URL without a leading `www.`.
///
/// For example: `"https://www.wired.com/feed"` -> `"wired.com"`.
pub fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_blank_title_falls_back() {
        let article = Article::new("   ", "https://example.com/a", "example.com");
        assert_eq!(article.title, NO_TITLE);
    }

    #[test]
    fn test_placeholder_row() {
        let article = Article::placeholder();
        assert_eq!(article.title, "Placeholder Article");
        assert_eq!(article.link, "");
        assert_eq!(article.source, "Unknown");
        assert!(article.is_placeholder());
    }

    #[test]
    fn test_empty_summary_is_dropped() {
        let article = Article::new("t", "https://example.com", "s").with_summary(Some(" ".into()));
        assert_eq!(article.summary, None);
    }

    #[test]
    fn test_host_label_strips_www() {
        assert_eq!(
            host_label("https://www.wired.com/feed/rss"),
            Some("wired.com".to_string())
        );
        assert_eq!(
            host_label("https://text.npr.org/article"),
            Some("text.npr.org".to_string())
        );
        assert_eq!(host_label("not a url"), None);
    }

    #[test]
    fn test_source_label_derived_from_host() {
        let source = Source::new(None, "https://www.cnet.com/rss/news/", SourceKind::Feed);
        assert_eq!(source.label, "cnet.com");

        let named = Source::new(Some("CNET".into()), "https://www.cnet.com/rss/news/", SourceKind::Feed);
        assert_eq!(named.label, "CNET");
    }
}
