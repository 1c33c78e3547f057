//! # News Sentinel
//!
//! A keyword-driven news collector. It reads RSS/Atom feeds and news web
//! pages, keeps the headlines that mention configured keywords, drops links
//! already seen, and writes a spreadsheet-friendly CSV with a guaranteed
//! minimum number of rows.
//!
//! ## Usage
//!
//! ```sh
//! news_sentinel -c config.json -o ./out --seen-file ./out/seen_articles.json
//! ```
//!
//! ## Architecture
//!
//! Each run is a linear pipeline:
//! 1. **Reading**: fetch every source concurrently (feeds and pages)
//! 2. **Filtering**: keep articles matching a keyword, optionally capped per keyword
//! 3. **Deduplication**: drop repeated links within the run and from earlier runs
//! 4. **Quota**: backfill from unmatched articles, then placeholders, up to the minimum
//! 5. **Output**: write the articles CSV, the error log and the seen-articles file
//!
//! A source that fails is logged and skipped. Only configuration and write
//! failures end the process with a non-zero exit code.

use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedup;
mod errors;
mod fetch;
mod filter;
mod models;
mod outputs;
mod pipeline;
mod quota;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use pipeline::Pipeline;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_sentinel starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output_dir, ?args.seen_file, ?args.seed, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Cannot load configuration");
            return Err(e.into());
        }
    };
    args.apply(&mut config);

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Cannot set up pipeline");
            return Err(e.into());
        }
    };

    // ---- Run ----
    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Failed to write results");
            return Err(e.into());
        }
    };

    if let Some(path) = &summary.error_log_path {
        info!(
            failed = summary.failed_sources,
            path = %path.display(),
            "Some sources failed; see error log"
        );
    }

    let top_keywords = summary
        .keyword_usage
        .0
        .iter()
        .filter(|(_, n)| *n > 0)
        .take(5)
        .map(|(k, n)| format!("{k}={n}"))
        .join(", ");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        fetched = summary.fetched,
        matched = summary.matched,
        kept = summary.quota.filtered,
        backfilled = summary.quota.backfilled,
        placeholders = summary.quota.placeholders,
        rows = summary.rows,
        %top_keywords,
        "Execution complete"
    );

    Ok(())
}
