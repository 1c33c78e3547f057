//! Error types for each failure class of a run.
//!
//! - [`ConfigError`]: fatal, raised before any fetch happens
//! - [`FetchError`]: recoverable, scoped to a single source
//! - [`WriteError`]: fatal, raised while persisting results

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid source URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed feed: {0}")]
    Feed(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Url(_) | FetchError::Feed(_))
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize seen articles: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl WriteError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WriteError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_errors_are_not_retried() {
        assert!(!FetchError::Feed("eof".into()).is_retryable());
        assert!(
            FetchError::Status {
                status: 503,
                url: "https://example.com".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_write_error_mentions_path() {
        let err = WriteError::io(
            "/nope/articles.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/nope/articles.csv"));
        assert!(msg.contains("denied"));
    }
}
