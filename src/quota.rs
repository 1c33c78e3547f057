//! Minimum-row quota.
//!
//! When keyword filtering leaves fewer articles than the configured minimum,
//! the output is topped up in two tiers:
//!
//! 1. real articles from the unfiltered pool, in pool order, skipping any
//!    whose link is already present;
//! 2. placeholder rows once the pool is exhausted.
//!
//! The result always has `max(minimum, filtered.len())` rows.

use crate::models::Article;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Row counts contributed by each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaFill {
    pub filtered: usize,
    pub backfilled: usize,
    pub placeholders: usize,
}

/// Pad `filtered` up to `minimum` rows.
#[instrument(level = "info", skip_all, fields(filtered = filtered.len(), pool = pool.len(), minimum = minimum))]
pub fn fill(filtered: Vec<Article>, pool: Vec<Article>, minimum: usize) -> (Vec<Article>, QuotaFill) {
    let mut stats = QuotaFill {
        filtered: filtered.len(),
        ..QuotaFill::default()
    };
    if filtered.len() >= minimum {
        return (filtered, stats);
    }

    let mut output = filtered;
    let mut present: HashSet<String> = output.iter().map(|a| a.dedup_key().to_string()).collect();

    for article in pool {
        if output.len() >= minimum {
            break;
        }
        if article.dedup_key().is_empty() || !present.insert(article.dedup_key().to_string()) {
            continue;
        }
        output.push(article);
        stats.backfilled += 1;
    }

    stats.placeholders = minimum - output.len();
    output.extend(std::iter::repeat_with(Article::placeholder).take(stats.placeholders));

    info!(
        backfilled = stats.backfilled,
        placeholders = stats.placeholders,
        total = output.len(),
        "Filled quota"
    );
    (output, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(i: usize) -> Article {
        Article::new(format!("Story {i}"), format!("https://news.example.com/{i}"), "example")
    }

    #[test]
    fn test_empty_inputs_give_all_placeholders() {
        let (output, stats) = fill(Vec::new(), Vec::new(), 100);
        assert_eq!(output.len(), 100);
        assert!(output.iter().all(Article::is_placeholder));
        assert_eq!(stats.placeholders, 100);
    }

    #[test]
    fn test_backfill_then_placeholders() {
        let filtered: Vec<Article> = (0..5).map(real).collect();
        let pool: Vec<Article> = (0..20).map(real).collect();

        let (output, stats) = fill(filtered, pool, 100);

        assert_eq!(output.len(), 100);
        assert_eq!(stats, QuotaFill { filtered: 5, backfilled: 15, placeholders: 80 });
        assert_eq!(output[0].link, "https://news.example.com/0");
        assert_eq!(output[5].link, "https://news.example.com/5");
        assert_eq!(output[19].link, "https://news.example.com/19");
        assert!(output[20..].iter().all(Article::is_placeholder));

        let links: std::collections::HashSet<&str> = output[..20].iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links.len(), 20);
    }

    #[test]
    fn test_enough_filtered_is_unchanged() {
        let filtered: Vec<Article> = (0..12).map(real).collect();
        let pool: Vec<Article> = (100..110).map(real).collect();
        let (output, stats) = fill(filtered.clone(), pool, 10);
        assert_eq!(output, filtered);
        assert_eq!(stats.backfilled, 0);
        assert_eq!(stats.placeholders, 0);
    }

    #[test]
    fn test_pool_stops_at_minimum() {
        let pool: Vec<Article> = (0..50).map(real).collect();
        let (output, stats) = fill(Vec::new(), pool, 10);
        assert_eq!(output.len(), 10);
        assert_eq!(stats.backfilled, 10);
        assert_eq!(output[9].link, "https://news.example.com/9");
    }

    #[test]
    fn test_pool_duplicates_skipped() {
        let pool = vec![real(1), real(1), real(2)];
        let (output, stats) = fill(Vec::new(), pool, 4);
        assert_eq!(stats.backfilled, 2);
        assert_eq!(stats.placeholders, 2);
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn test_length_invariant() {
        for minimum in [0, 1, 3, 7] {
            for n_filtered in [0, 2, 5] {
                let filtered: Vec<Article> = (0..n_filtered).map(real).collect();
                let pool: Vec<Article> = (0..4).map(real).collect();
                let (output, _) = fill(filtered, pool, minimum);
                assert_eq!(output.len(), minimum.max(n_filtered));
            }
        }
    }
}
