//! Output files produced by a run.
//!
//! # Submodules
//!
//! - [`csv`]: the article table, with links as spreadsheet hyperlink formulas
//! - [`error_log`]: sources that failed, written only when there are any
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles_2024-12-22_09-15-00.csv
//! └── scraper_log_2024-12-22_09-15-00.csv   # only if a source failed
//! ```

pub mod csv;
pub mod error_log;

use crate::utils::file_timestamp;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Paths of the files written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub articles: PathBuf,
    pub error_log: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, started: &DateTime<Local>) -> Self {
        let stamp = file_timestamp(started);
        Self {
            articles: output_dir.join(format!("articles_{stamp}.csv")),
            error_log: output_dir.join(format!("scraper_log_{stamp}.csv")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_paths() {
        let started = Local.with_ymd_and_hms(2024, 12, 22, 9, 15, 0).unwrap();
        let paths = OutputPaths::new(Path::new("/tmp/out"), &started);
        assert_eq!(paths.articles, PathBuf::from("/tmp/out/articles_2024-12-22_09-15-00.csv"));
        assert_eq!(paths.error_log, PathBuf::from("/tmp/out/scraper_log_2024-12-22_09-15-00.csv"));
    }
}
