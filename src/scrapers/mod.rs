//! Source readers for syndication feeds and HTML pages.
//!
//! Each configured source is read with one of two strategies:
//!
//! | Kind | Module | Method |
//! |------|--------|--------|
//! | Feed | [`feed`] | RSS / Atom parsing via `feed-rs` |
//! | Page | [`page`] | HTML scraping with fallback selectors |
//!
//! [`read_all`] runs every source concurrently with a bounded number of
//! in-flight requests. Results come back by value, one [`SourceReport`] per
//! source in configuration order; failures are reported in the report instead
//! of aborting the run.

pub mod feed;
pub mod page;

use crate::fetch::Fetch;
use crate::models::{Source, SourceKind, SourceReport};
use futures::stream::{self, StreamExt};
use page::PageExtractor;
use tracing::{error, info, instrument};

/// Read a single source, converting any failure into the report.
#[instrument(level = "info", skip_all, fields(source = %source.label))]
pub async fn read_source<F: Fetch>(
    fetcher: &F,
    source: Source,
    extractor: &PageExtractor,
) -> SourceReport {
    let outcome = match source.kind {
        SourceKind::Feed => feed::read(fetcher, &source).await,
        SourceKind::Page => page::read(fetcher, &source, extractor).await,
    };

    match &outcome {
        Ok(articles) => info!(count = articles.len(), url = %source.url, "Read source"),
        Err(e) => error!(error = %e, url = %source.url, "Source failed; continuing without it"),
    }

    SourceReport { source, outcome }
}

/// Read all sources with at most `concurrency` in flight.
#[instrument(level = "info", skip_all, fields(sources = sources.len(), concurrency = concurrency))]
pub async fn read_all<F: Fetch>(
    fetcher: &F,
    sources: Vec<Source>,
    extractor: &PageExtractor,
    concurrency: usize,
) -> Vec<SourceReport> {
    let reports: Vec<SourceReport> = stream::iter(sources)
        .map(|source| read_source(fetcher, source, extractor))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    let articles: usize = reports.iter().map(SourceReport::article_count).sum();
    info!(
        total = reports.len(),
        failed,
        articles,
        "Finished reading sources"
    );
    reports
}
