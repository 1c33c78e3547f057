//! Error log of sources that could not be read.
//!
//! Written next to the articles CSV, only when at least one source failed,
//! with the columns `Timestamp,URL,Error`.

use super::csv::write_row;
use crate::errors::WriteError;
use crate::models::FetchFailure;
use std::io::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const HEADER: [&str; 3] = ["Timestamp", "URL", "Error"];

pub fn write_failures_to<W: Write>(mut w: W, failures: &[FetchFailure]) -> io::Result<()> {
    write_row(&mut w, &HEADER)?;
    for failure in failures {
        write_row(
            &mut w,
            &[
                failure.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                failure.url.clone(),
                failure.error.clone(),
            ],
        )?;
    }
    w.flush()
}

/// Write `failures` to `path`. Returns `Ok(false)` without touching the disk when empty.
#[instrument(level = "info", skip_all, fields(path = %path.display(), failures = failures.len()))]
pub async fn write_error_log(path: &Path, failures: &[FetchFailure]) -> Result<bool, WriteError> {
    if failures.is_empty() {
        info!("No errors to log");
        return Ok(false);
    }
    let mut buf = Vec::new();
    write_failures_to(&mut buf, failures).map_err(|e| WriteError::io(path, e))?;
    fs::write(path, buf).await.map_err(|e| WriteError::io(path, e))?;
    info!("Wrote error log");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::csv::parse_rows;
    use chrono::{Local, TimeZone};

    #[tokio::test]
    async fn test_no_failures_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_log.csv");
        assert!(!write_error_log(&path, &[]).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failures_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_log.csv");
        let failures = vec![FetchFailure {
            timestamp: Local.with_ymd_and_hms(2024, 12, 22, 9, 15, 0).unwrap(),
            url: "https://down.example.com/".into(),
            error: "HTTP status 503 from https://down.example.com/".into(),
        }];

        assert!(write_error_log(&path, &failures).await.unwrap());
        let rows = parse_rows(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(rows[0], vec!["Timestamp", "URL", "Error"]);
        assert_eq!(rows[1][0], "2024-12-22 09:15:00");
        assert_eq!(rows[1][1], "https://down.example.com/");
        assert!(rows[1][2].contains("503"));
    }
}
