//! Keyword matching and source exclusion.
//!
//! Keywords are matched case-insensitively against the article title and,
//! when enabled, its summary. Two matching modes exist:
//!
//! - **Word** (default): the keyword must sit on word boundaries, so `AI`
//!   matches "AI chips" but not "said".
//! - **Substring**: plain containment.
//!
//! # Keyword cap
//!
//! With a cap of `N`, at most `N` kept articles may cite a given keyword. To
//! keep one keyword from always winning the race for the slots, keyword order
//! is shuffled per article before the cap is applied, so which keywords get
//! suppressed varies between runs unless the random generator is seeded.

use crate::config::{Config, MatchMode};
use crate::models::Article;
use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
enum Matcher {
    Word(Regex),
    /// Lowercased needle.
    Substring(String),
}

#[derive(Debug, Clone)]
struct Keyword {
    text: String,
    matcher: Matcher,
}

impl Keyword {
    fn new(text: &str, mode: MatchMode) -> Result<Self, regex::Error> {
        let matcher = match mode {
            MatchMode::Word => {
                // `\b` only makes sense next to a word character ("C++" has none at its end).
                let is_word = |c: char| c.is_alphanumeric() || c == '_';
                let head = if text.starts_with(is_word) { r"\b" } else { "" };
                let tail = if text.ends_with(is_word) { r"\b" } else { "" };
                let pattern = format!("{head}{}{tail}", regex::escape(text));
                Matcher::Word(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
            }
            MatchMode::Substring => Matcher::Substring(text.to_lowercase()),
        };
        Ok(Self {
            text: text.to_string(),
            matcher,
        })
    }

    /// `haystack_lower` must be `haystack.to_lowercase()`.
    fn is_match(&self, haystack: &str, haystack_lower: &str) -> bool {
        match &self.matcher {
            Matcher::Word(re) => re.is_match(haystack),
            Matcher::Substring(needle) => haystack_lower.contains(needle.as_str()),
        }
    }
}

/// Per-keyword count of kept articles, most used first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordUsage(pub Vec<(String, usize)>);

impl KeywordUsage {
    pub fn get(&self, keyword: &str) -> usize {
        self.0
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<Keyword>,
    match_summary: bool,
    cap: Option<usize>,
}

impl KeywordFilter {
    pub fn new(
        keywords: &[String],
        mode: MatchMode,
        match_summary: bool,
        cap: Option<usize>,
    ) -> Result<Self, regex::Error> {
        let keywords = keywords
            .iter()
            .unique()
            .map(|k| Keyword::new(k, mode))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            keywords,
            match_summary,
            cap,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, regex::Error> {
        Self::new(
            &config.keywords,
            config.match_mode,
            config.match_summary,
            config.keyword_cap,
        )
    }

    fn haystack(&self, article: &Article) -> String {
        match (&article.summary, self.match_summary) {
            (Some(summary), true) => format!("{} {}", article.title, summary),
            _ => article.title.clone(),
        }
    }

    /// Keywords matching `article`, in configuration order. Ignores the cap.
    pub fn matches(&self, article: &Article) -> Vec<String> {
        let haystack = self.haystack(article);
        let lower = haystack.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| k.is_match(&haystack, &lower))
            .map(|k| k.text.clone())
            .collect()
    }

    /// Keep the articles that match at least one keyword, recording the matches.
    ///
    /// `admit` is asked only about articles that still have an uncapped match,
    /// and a rejected article does not take a slot from any keyword. Without a
    /// cap this is deterministic and `rng` is never used.
    #[instrument(level = "info", skip_all, fields(articles = articles.len(), cap = ?self.cap))]
    pub fn apply<R, P>(&self, articles: Vec<Article>, rng: &mut R, mut admit: P) -> (Vec<Article>, KeywordUsage)
    where
        R: Rng + ?Sized,
        P: FnMut(&Article) -> bool,
    {
        let mut counts = vec![0usize; self.keywords.len()];
        let mut order: Vec<usize> = (0..self.keywords.len()).collect();
        let mut kept = Vec::new();
        let total = articles.len();

        for mut article in articles {
            let haystack = self.haystack(&article);
            let lower = haystack.to_lowercase();

            if self.cap.is_some() {
                order.shuffle(rng);
            }

            let matched: Vec<usize> = order
                .iter()
                .copied()
                .filter(|&i| self.keywords[i].is_match(&haystack, &lower))
                .filter(|&i| self.cap.is_none_or(|cap| counts[i] < cap))
                .collect();

            if matched.is_empty() {
                debug!(title = %article.title, "Filtered out by keyword");
                continue;
            }
            if !admit(&article) {
                debug!(link = %article.link, "Matched but not admitted");
                continue;
            }
            for &i in &matched {
                counts[i] += 1;
            }
            article.matched_keywords = matched.iter().map(|&i| self.keywords[i].text.clone()).collect();
            kept.push(article);
        }

        let usage = KeywordUsage(
            self.keywords
                .iter()
                .zip(counts)
                .map(|(k, n)| (k.text.clone(), n))
                .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
                .collect(),
        );
        for (keyword, count) in usage.0.iter().filter(|(_, n)| *n > 0) {
            info!(%keyword, count, "Keyword usage");
        }
        info!(total, kept = kept.len(), "Applied keyword filter");
        (kept, usage)
    }
}

/// Drop articles whose link host is in `excluded` (leading `www.` ignored).
pub fn exclude_sources(articles: Vec<Article>, excluded: &[String]) -> Vec<Article> {
    if excluded.is_empty() {
        return articles;
    }
    let hosts: HashSet<String> = excluded
        .iter()
        .map(|h| {
            let h = h.trim().to_lowercase();
            h.strip_prefix("www.").map(str::to_string).unwrap_or(h)
        })
        .collect();
    let before = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|a| !a.host().is_some_and(|h| hosts.contains(&h.to_lowercase())))
        .collect();
    debug!(dropped = before - kept.len(), "Excluded sources");
    kept
}
