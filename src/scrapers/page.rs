//! HTML page reader.
//!
//! News front pages differ wildly, so links are located with two strategies,
//! tried in order:
//!
//! 1. **Blocks**: every `article` / `section` element is treated as one story.
//!    The headline is the first `h1`, `h2`, `h3` or `title` inside it, falling
//!    back to the first paragraph and then to [`NO_TITLE`]. The first http(s)
//!    link in the block is the story link and the block text is kept as its summary.
//! 2. **Anchors**: when no block yields a story, the configured selectors
//!    (`h2 a`, `article a`, ..., `a`) are tried in order and the first one that
//!    matches at least one titled link wins.
//!
//! Relative `href`s are resolved against the page URL.

use crate::errors::FetchError;
use crate::fetch::Fetch;
use crate::models::{Article, NO_TITLE, Source};
use crate::utils::{collapse_whitespace, resolve_link};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article, section").unwrap());
static HEADLINE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["h1", "h2", "h3", "title"]
        .iter()
        .map(|tag| Selector::parse(tag).unwrap())
        .collect()
});
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Compiled anchor selectors for the fallback strategy.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    anchor_selectors: Vec<(String, Selector)>,
}

impl PageExtractor {
    /// Compile `selectors`, failing on the first one that is not valid CSS.
    pub fn new(selectors: &[String]) -> Result<Self, String> {
        let anchor_selectors = selectors
            .iter()
            .map(|s| {
                Selector::parse(s)
                    .map(|sel| (s.clone(), sel))
                    .map_err(|e| format!("bad page selector {s:?}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { anchor_selectors })
    }

    /// Extract stories from an HTML document located at `page_url`.
    pub fn extract(&self, html: &str, page_url: &Url, source_label: &str) -> Vec<Article> {
        let document = Html::parse_document(html);

        let from_blocks = extract_blocks(&document, page_url, source_label);
        if !from_blocks.is_empty() {
            debug!(count = from_blocks.len(), "Extracted stories from article/section blocks");
            return from_blocks;
        }

        for (name, selector) in &self.anchor_selectors {
            let mut seen = HashSet::new();
            let found: Vec<Article> = document
                .select(selector)
                .filter_map(|anchor| {
                    let href = anchor.value().attr("href")?;
                    let link = resolve_link(page_url, href)?;
                    let title = element_text(&anchor);
                    if title.is_empty() || !seen.insert(link.clone()) {
                        return None;
                    }
                    Some(Article::new(title, link, source_label))
                })
                .collect();
            if !found.is_empty() {
                debug!(selector = %name, count = found.len(), "Extracted stories from anchors");
                return found;
            }
        }

        debug!("No stories found on page");
        Vec::new()
    }
}

fn extract_blocks(document: &Html, page_url: &Url, source_label: &str) -> Vec<Article> {
    let mut seen = HashSet::new();
    document
        .select(&BLOCK_SELECTOR)
        .filter_map(|block| {
            let link = block
                .select(&LINK_SELECTOR)
                .find_map(|a| resolve_link(page_url, a.value().attr("href")?))?;
            if !seen.insert(link.clone()) {
                return None;
            }
            let title = block_title(&block);
            let summary = element_text(&block);
            Some(Article::new(title, link, source_label).with_summary(Some(summary)))
        })
        .collect()
}

fn block_title(block: &ElementRef<'_>) -> String {
    HEADLINE_SELECTORS
        .iter()
        .find_map(|sel| block.select(sel).next())
        .or_else(|| block.select(&PARAGRAPH_SELECTOR).next())
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Download one page and extract its stories.
#[instrument(level = "info", skip_all, fields(source = %source.label, url = %source.url))]
pub async fn read<F: Fetch>(
    fetcher: &F,
    source: &Source,
    extractor: &PageExtractor,
) -> Result<Vec<Article>, FetchError> {
    let page_url = Url::parse(&source.url)?;
    let body = fetcher.fetch(&source.url).await?;
    Ok(extractor.extract(&body, &page_url, &source.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PAGE_SELECTORS;

    fn extractor() -> PageExtractor {
        let selectors: Vec<String> = DEFAULT_PAGE_SELECTORS.iter().map(|s| s.to_string()).collect();
        PageExtractor::new(&selectors).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://example.com/news").unwrap()
    }

    #[test]
    fn test_block_strategy() {
        let html = r#"
            <html><body>
              <article>
                <h2>AI startup raises funds</h2>
                <a href="/story/1">Read more</a>
                <p>Investors bet on machine learning.</p>
              </article>
              <section>
                <p>Untitled teaser text</p>
                <a href="https://other.org/story/2">More</a>
              </section>
              <article><h3>No link in this one</h3></article>
            </body></html>"#;

        let articles = extractor().extract(html, &page_url(), "example.com");
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "AI startup raises funds");
        assert_eq!(articles[0].link, "https://example.com/story/1");
        assert!(articles[0].summary.as_deref().unwrap().contains("machine learning"));
        assert_eq!(articles[1].title, "Untitled teaser text");
        assert_eq!(articles[1].link, "https://other.org/story/2");
    }

    #[test]
    fn test_block_skips_non_http_anchors() {
        let html = r#"
            <article>
              <h2>Robotics roundup</h2>
              <a href="mailto:desk@example.com">Email the desk</a>
              <a href="javascript:void(0)">Share</a>
              <a href="/story/robots">Read more</a>
            </article>"#;

        let articles = extractor().extract(html, &page_url(), "example.com");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Robotics roundup");
        assert_eq!(articles[0].link, "https://example.com/story/robots");
    }

    #[test]
    fn test_block_without_headline_or_paragraph() {
        let html = r#"<article><a href="/x"></a></article>"#;
        let articles = extractor().extract(html, &page_url(), "example.com");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, NO_TITLE);
    }

    #[test]
    fn test_anchor_fallback_resolves_relative_links() {
        let html = r#"
            <html><body>
              <div><h2><a href="/story/1">Python 3.14 is out</a></h2></div>
              <div><h2><a href="/story/1#comments">Python 3.14 is out</a></h2></div>
              <div><h3><a href="/story/3">Ignored, h2 matched first</a></h3></div>
              <a href="mailto:tips@example.com">Send tips</a>
            </body></html>"#;

        let articles = extractor().extract(html, &page_url(), "example.com");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://example.com/story/1");
        assert_eq!(articles[0].title, "Python 3.14 is out");
        assert_eq!(articles[0].source, "example.com");
    }

    #[test]
    fn test_bare_anchor_fallback_skips_untitled() {
        let html = r#"<p><a href="/a"><img src="x.png"></a> <a href="/b">Deep learning</a></p>"#;
        let articles = extractor().extract(html, &page_url(), "example.com");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://example.com/b");
    }

    #[test]
    fn test_empty_page() {
        let articles = extractor().extract("<html></html>", &page_url(), "example.com");
        assert!(articles.is_empty());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        for bad in ["a[[", "::"] {
            let err = PageExtractor::new(&["h2 a".to_string(), bad.to_string()]).unwrap_err();
            assert!(err.contains(bad), "unexpected message: {err}");
        }
    }

    #[tokio::test]
    async fn test_read_reports_fetch_errors() {
        struct Down;
        impl Fetch for Down {
            async fn fetch(&self, url: &str) -> Result<String, FetchError> {
                Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            }
        }

        let source = Source::new(None, "https://example.com/news", crate::models::SourceKind::Page);
        let err = read(&Down, &source, &extractor()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
