//! Run configuration loaded from a JSON or YAML file.
//!
//! Keys are upper-case (`KEYWORDS`, `WEBSITES`, `RSS_FEEDS`,
//! `MINIMUM_ARTICLES`, ...). Everything except `KEYWORDS` and at least one
//! source has a default.
//!
//! # Example
//!
//! ```json
//! {
//!   "KEYWORDS": ["AI", "machine learning"],
//!   "RSS_FEEDS": { "Wired": "https://www.wired.com/feed/rss" },
//!   "WEBSITES": ["https://www.technologyreview.com/"],
//!   "MINIMUM_ARTICLES": 100
//! }
//! ```

use crate::errors::ConfigError;
use crate::fetch::RetryPolicy;
use crate::models::{Source, SourceKind};
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Anchor selectors tried in order when a page has no `article`/`section` blocks.
pub const DEFAULT_PAGE_SELECTORS: &[&str] = &[
    "h1 a",
    "h2 a",
    "h3 a",
    "h4 a",
    "article a",
    "div.article a",
    "header a",
    "a",
];

/// A list of source URLs, either bare or keyed by a display label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceList {
    Urls(Vec<String>),
    Labeled(BTreeMap<String, String>),
}

impl Default for SourceList {
    fn default() -> Self {
        SourceList::Urls(Vec::new())
    }
}

impl SourceList {
    fn to_sources(&self, kind: SourceKind) -> Vec<Source> {
        match self {
            SourceList::Urls(urls) => urls
                .iter()
                .map(|url| Source::new(None, url.trim(), kind))
                .collect(),
            SourceList::Labeled(map) => map
                .iter()
                .map(|(label, url)| Source::new(Some(label.clone()), url.trim(), kind))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceList::Urls(urls) => urls.len(),
            SourceList::Labeled(map) => map.len(),
        }
    }
}

/// How a keyword is compared against article text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Case-insensitive match on word boundaries, so "AI" does not match "said".
    #[default]
    Word,
    /// Case-insensitive substring match.
    Substring,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct Config {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub websites: SourceList,
    #[serde(default)]
    pub rss_feeds: SourceList,
    #[serde(default = "default_minimum_articles")]
    pub minimum_articles: usize,
    /// Maximum number of kept articles that may cite any single keyword.
    #[serde(default)]
    pub keyword_cap: Option<usize>,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default = "default_true")]
    pub match_summary: bool,
    /// Hosts whose articles are dropped before filtering.
    #[serde(default)]
    pub excluded_sources: Vec<String>,
    #[serde(default)]
    pub seen_articles_file: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default)]
    pub retry_jitter_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_page_selectors")]
    pub page_selectors: Vec<String>,
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_minimum_articles() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_page_selectors() -> Vec<String> {
    DEFAULT_PAGE_SELECTORS.iter().map(|s| s.to_string()).collect()
}

/// Syntax of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml` / `.yml` files are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

impl Config {
    /// Read, parse and validate the config file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, ConfigFormat::from_path(path))?;
        info!(
            keywords = config.keywords.len(),
            feeds = config.rss_feeds.len(),
            websites = config.websites.len(),
            minimum = config.minimum_articles,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let mut config: Config = match format {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
        };
        config.keywords = config
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Invalid("KEYWORDS must not be empty".into()));
        }
        if self.rss_feeds.len() + self.websites.len() == 0 {
            return Err(ConfigError::Invalid(
                "at least one of WEBSITES or RSS_FEEDS must list a source".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("MAX_CONCURRENCY must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("MAX_ATTEMPTS must be at least 1".into()));
        }
        if self.keyword_cap == Some(0) {
            return Err(ConfigError::Invalid("KEYWORD_CAP must be at least 1".into()));
        }
        if self.page_selectors.is_empty() {
            return Err(ConfigError::Invalid("PAGE_SELECTORS must not be empty".into()));
        }
        for selector in &self.page_selectors {
            Selector::parse(selector).map_err(|e| {
                ConfigError::Invalid(format!("bad page selector {selector:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// All configured sources: feeds first, then web pages.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = self.rss_feeds.to_sources(SourceKind::Feed);
        sources.extend(self.websites.to_sources(SourceKind::Page));
        sources
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
            max_jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
