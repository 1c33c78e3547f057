//! Duplicate suppression within a run and, optionally, across runs.
//!
//! The dedup key is the article link. Keys recorded by earlier runs are loaded
//! from a JSON file (a flat array of strings) at start-up and the full set is
//! rewritten at the end of the run.
//!
//! Entries never expire, so the seen-articles file grows without bound. Two
//! runs sharing the same file at the same time may overwrite each other's
//! additions; the tool assumes a single running instance.

use crate::errors::WriteError;
use crate::models::Article;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
pub struct Deduplicator {
    /// Keys loaded from the seen-articles file.
    previous: HashSet<String>,
    /// Keys recorded during this run.
    current: HashSet<String>,
    store: Option<PathBuf>,
}

impl Deduplicator {
    /// A deduplicator with no persisted history.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load history from `path`.
    ///
    /// A missing file starts fresh. An unreadable or corrupt file is logged and
    /// also starts fresh; it is overwritten at the end of the run.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Self {
        let previous = match fs::read_to_string(path).await {
            Ok(text) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(keys) => keys.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "Seen-articles file is corrupt; starting fresh");
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Seen-articles file not found; starting fresh");
                HashSet::new()
            }
            Err(e) => {
                warn!(error = %e, "Cannot read seen-articles file; starting fresh");
                HashSet::new()
            }
        };
        info!(count = previous.len(), "Loaded seen articles");
        Self {
            previous,
            current: HashSet::new(),
            store: Some(path.to_path_buf()),
        }
    }

    /// Whether the article is unseen; records its key when it is.
    pub fn is_new(&mut self, article: &Article) -> bool {
        let key = article.dedup_key();
        if key.is_empty() || self.previous.contains(key) {
            return false;
        }
        self.current.insert(key.to_string())
    }

    /// Whether an earlier run already emitted this article.
    pub fn seen_before(&self, article: &Article) -> bool {
        self.previous.contains(article.dedup_key())
    }

    /// Record the key of an emitted article. Placeholders have no key and are ignored.
    pub fn record(&mut self, article: &Article) {
        let key = article.dedup_key();
        if !key.is_empty() {
            self.current.insert(key.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.previous.union(&self.current).count()
    }

    /// Rewrite the seen-articles file with every known key. No-op without a store.
    #[instrument(level = "info", skip_all)]
    pub async fn save(&self) -> Result<(), WriteError> {
        let Some(path) = &self.store else {
            return Ok(());
        };
        let mut keys: Vec<&String> = self.previous.union(&self.current).collect();
        keys.sort();
        let json = serde_json::to_string_pretty(&keys)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| WriteError::io(parent, e))?;
        }
        fs::write(path, json).await.map_err(|e| WriteError::io(path, e))?;
        info!(path = %path.display(), count = keys.len(), "Saved seen articles");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(link: &str) -> Article {
        Article::new("title", link, "test")
    }

    #[test]
    fn test_duplicate_links_dropped() {
        let mut dedup = Deduplicator::in_memory();
        assert!(dedup.is_new(&article("https://a.com/1")));
        assert!(!dedup.is_new(&Article::new("Different title, same link", "https://a.com/1", "other")));
        assert!(dedup.is_new(&article("https://a.com/2")));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_empty_link_never_new() {
        let mut dedup = Deduplicator::in_memory();
        assert!(!dedup.is_new(&Article::placeholder()));
        dedup.record(&Article::placeholder());
        assert_eq!(dedup.len(), 0);
    }

    #[tokio::test]
    async fn test_persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen_articles.json");

        let mut first = Deduplicator::load(&path).await;
        assert!(first.is_new(&article("https://a.com/1")));
        first.record(&article("https://a.com/2"));
        first.save().await.unwrap();

        let mut second = Deduplicator::load(&path).await;
        assert!(second.seen_before(&article("https://a.com/1")));
        assert!(!second.is_new(&article("https://a.com/1")));
        assert!(!second.is_new(&article("https://a.com/2")));
        assert!(second.is_new(&article("https://a.com/3")));
        second.save().await.unwrap();

        let stored: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored, vec!["https://a.com/1", "https://a.com/2", "https://a.com/3"]);
    }

    #[tokio::test]
    async fn test_corrupt_store_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_articles.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut dedup = Deduplicator::load(&path).await;
        assert_eq!(dedup.len(), 0);
        assert!(dedup.is_new(&article("https://a.com/1")));
    }

    #[tokio::test]
    async fn test_save_without_store_is_noop() {
        let mut dedup = Deduplicator::in_memory();
        dedup.record(&article("https://a.com/1"));
        dedup.save().await.unwrap();
    }
}
