//! Command-line interface definitions for News Sentinel.
//!
//! This module defines the CLI arguments using the `clap` crate. Flags take
//! precedence over the matching keys in the configuration file.

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Sentinel application.
///
/// # Examples
///
/// ```sh
/// # Read ./config.json, write CSVs to the current directory
/// news_sentinel
///
/// # YAML config, separate output directory, persistent dedup history
/// news_sentinel -c sentinel.yaml -o ./out --seen-file ./state/seen_articles.json
///
/// # Reproducible keyword-cap shuffle
/// news_sentinel --seed 42
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON or YAML config file
    #[arg(short, long, env = "NEWS_SENTINEL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory for the articles CSV and error log (overrides OUTPUT_DIR)
    #[arg(short, long, env = "NEWS_SENTINEL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON file of links emitted by earlier runs (overrides SEEN_ARTICLES_FILE)
    #[arg(long)]
    pub seen_file: Option<PathBuf>,

    /// Seed for the keyword-cap shuffle (overrides SHUFFLE_SEED)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Apply flag overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.seen_file {
            config.seen_articles_file = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            config.shuffle_seed = Some(seed);
        }
    }
}
