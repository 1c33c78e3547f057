//! RSS / Atom feed reader.
//!
//! Feeds are parsed with `feed-rs`, which accepts RSS 0.9x/1.0/2.0, Atom and
//! JSON Feed. Each entry becomes an [`Article`] carrying the entry title, its
//! primary link and a plain-text summary used for keyword matching.
//!
//! A body that is not a feed at all is reported as [`FetchError::Feed`]; the
//! caller logs it and treats the source as empty.

use crate::errors::FetchError;
use crate::fetch::Fetch;
use crate::models::{Article, Source};
use crate::utils::{html_to_text, resolve_link};
use feed_rs::model::Entry;
use tracing::{debug, instrument};
use url::Url;

/// Download and parse one feed.
#[instrument(level = "info", skip_all, fields(source = %source.label, url = %source.url))]
pub async fn read<F: Fetch>(fetcher: &F, source: &Source) -> Result<Vec<Article>, FetchError> {
    let base = Url::parse(&source.url)?;
    let body = fetcher.fetch(&source.url).await?;
    parse_feed(&body, &base, &source.label)
}

/// Extract articles from a feed document.
///
/// Entries without any usable link are skipped. Relative links are resolved
/// against `base`.
pub fn parse_feed(body: &str, base: &Url, source_label: &str) -> Result<Vec<Article>, FetchError> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| FetchError::Feed(e.to_string()))?;

    let total = feed.entries.len();
    let articles: Vec<Article> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry_link(&entry).and_then(|href| resolve_link(base, &href))?;
            let title = entry
                .title
                .as_ref()
                .map(|t| html_to_text(&t.content))
                .unwrap_or_default();
            let summary = entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
                .map(|html| html_to_text(&html));
            Some(Article::new(title, link, source_label).with_summary(summary))
        })
        .collect();

    debug!(entries = total, kept = articles.len(), "Parsed feed");
    Ok(articles)
}

/// Pick the entry's alternate link, then any link, then an URL-shaped id.
fn entry_link(entry: &Entry) -> Option<String> {
    let alternate = entry.links.iter().find(|l| {
        !l.href.trim().is_empty()
            && l.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
    });
    if let Some(link) = alternate.or_else(|| entry.links.iter().find(|l| !l.href.trim().is_empty())) {
        return Some(link.href.trim().to_string());
    }
    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return Some(id.to_string());
    }
    None
}
