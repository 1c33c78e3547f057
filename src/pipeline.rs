//! One collection run: read → filter → dedupe → fill quota → write.
//!
//! [`Pipeline`] owns everything a run needs (configuration, HTTP stack,
//! compiled selectors and keyword matchers). The per-run state, i.e. the
//! dedup set and the failure list, lives inside [`Pipeline::run`] and is
//! dropped when it returns, apart from the seen-articles file.

use crate::config::Config;
use crate::dedup::Deduplicator;
use crate::errors::{ConfigError, WriteError};
use crate::fetch::{Fetch, HttpFetcher, RetryFetch};
use crate::filter::{KeywordFilter, KeywordUsage, exclude_sources};
use crate::models::{Article, FetchFailure, SourceReport};
use crate::outputs::error_log::write_error_log;
use crate::outputs::{OutputPaths, csv};
use crate::quota::{self, QuotaFill};
use crate::scrapers::{self, page::PageExtractor};
use crate::utils::{ensure_writable_dir, truncate_for_log};
use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources: usize,
    pub failed_sources: usize,
    /// Articles extracted from all sources, after source exclusion.
    pub fetched: usize,
    /// Articles that matched at least one keyword, repeats included, before the cap.
    pub matched: usize,
    /// Matched articles kept after the cap and duplicate checks.
    pub new: usize,
    pub quota: QuotaFill,
    pub rows: usize,
    pub keyword_usage: KeywordUsage,
    pub articles_path: PathBuf,
    pub error_log_path: Option<PathBuf>,
}

pub struct Pipeline<F> {
    config: Config,
    fetcher: F,
    extractor: PageExtractor,
    filter: KeywordFilter,
}

impl Pipeline<RetryFetch<HttpFetcher>> {
    /// Build a pipeline that fetches over HTTP with the configured retry policy.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let http = HttpFetcher::new(&config.user_agent, config.request_timeout())
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;
        let fetcher = RetryFetch::new(http, config.retry_policy());
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> Pipeline<F> {
    pub fn with_fetcher(config: Config, fetcher: F) -> Result<Self, ConfigError> {
        let extractor = PageExtractor::new(&config.page_selectors).map_err(ConfigError::Invalid)?;
        let filter = KeywordFilter::from_config(&config)
            .map_err(|e| ConfigError::Invalid(format!("bad keyword pattern: {e}")))?;
        Ok(Self {
            config,
            fetcher,
            extractor,
            filter,
        })
    }

    /// Run once. Source failures are logged and skipped; only write failures abort.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Result<RunSummary, WriteError> {
        let started = Local::now();
        let output_dir = &self.config.output_dir;
        ensure_writable_dir(output_dir)
            .await
            .map_err(|e| WriteError::io(output_dir, e))?;
        let paths = OutputPaths::new(output_dir, &started);

        let mut dedup = match &self.config.seen_articles_file {
            Some(path) => Deduplicator::load(path).await,
            None => Deduplicator::in_memory(),
        };

        let sources = self.config.sources();
        let source_count = sources.len();
        let reports = scrapers::read_all(
            &self.fetcher,
            sources,
            &self.extractor,
            self.config.max_concurrency,
        )
        .await;
        let (raw, failures) = collect_reports(reports);
        let raw = exclude_sources(raw, &self.config.excluded_sources);
        let fetched = raw.len();

        let mut rng = match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let matched_count = raw.iter().filter(|a| !self.filter.matches(a).is_empty()).count();
        // Cap slots go only to articles the deduplicator admits.
        let (fresh, keyword_usage) = self.filter.apply(raw.clone(), &mut rng, |a| dedup.is_new(a));
        let new = fresh.len();

        let pool: Vec<Article> = raw.into_iter().filter(|a| !dedup.seen_before(a)).collect();
        let (output, quota) = quota::fill(fresh, pool, self.config.minimum_articles);
        if quota.backfilled + quota.placeholders > 0 {
            warn!(
                minimum = self.config.minimum_articles,
                matched = new,
                backfilled = quota.backfilled,
                placeholders = quota.placeholders,
                "Fewer matching articles than the minimum; padded output"
            );
        }
        for article in &output {
            dedup.record(article);
        }

        csv::write_articles(&paths.articles, &output).await?;
        let error_log_path = write_error_log(&paths.error_log, &failures)
            .await?
            .then(|| paths.error_log.clone());
        dedup.save().await?;

        let summary = RunSummary {
            sources: source_count,
            failed_sources: failures.len(),
            fetched,
            matched: matched_count,
            new,
            quota,
            rows: output.len(),
            keyword_usage,
            articles_path: paths.articles,
            error_log_path,
        };
        info!(
            sources = summary.sources,
            failed = summary.failed_sources,
            fetched = summary.fetched,
            matched = summary.matched,
            new = summary.new,
            rows = summary.rows,
            seen = dedup.len(),
            path = %summary.articles_path.display(),
            "Run complete"
        );
        Ok(summary)
    }
}

/// Split reports into the extracted articles and the error-log rows.
fn collect_reports(reports: Vec<SourceReport>) -> (Vec<Article>, Vec<FetchFailure>) {
    let mut articles = Vec::new();
    let mut failures = Vec::new();
    for report in reports {
        match report.outcome {
            Ok(found) => articles.extend(found),
            Err(e) => {
                let error = e.to_string();
                warn!(
                    source = %report.source.label,
                    url = %report.source.url,
                    error = %truncate_for_log(&error, 300),
                    "Recording source failure"
                );
                failures.push(FetchFailure {
                    timestamp: Local::now(),
                    url: report.source.url,
                    error,
                });
            }
        }
    }
    (articles, failures)
}
