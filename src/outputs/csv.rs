//! CSV output of the final article list.
//!
//! # Columns
//!
//! | Column | Content |
//! |--------|---------|
//! | `Source` | source label |
//! | `Title` | headline |
//! | `Link` | `=HYPERLINK("<url>", "<url>")`, empty for placeholder rows |
//! | `Keywords` | matched keywords joined with `", "` |
//!
//! Fields are quoted per RFC 4180 when they contain a comma, quote or line
//! break. Rows end with `\n`.

use crate::errors::WriteError;
use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};
use std::mem::take;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const HEADER: [&str; 4] = ["Source", "Title", "Link", "Keywords"];

static HYPERLINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^=HYPERLINK\("((?:[^"]|"")*)"(?:\s*,\s*"(?:[^"]|"")*")?\)$"#).unwrap());

/* ---------------- Hyperlink formula ---------------- */

/// Wrap `url` in a spreadsheet hyperlink formula showing the URL itself.
pub fn hyperlink(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let escaped = url.replace('"', "\"\"");
    format!("=HYPERLINK(\"{escaped}\", \"{escaped}\")")
}

/// Recover the target URL from a cell written by [`hyperlink`].
pub fn hyperlink_target(cell: &str) -> Option<String> {
    HYPERLINK_RE
        .captures(cell.trim())
        .map(|caps| caps[1].replace("\"\"", "\""))
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

fn article_row(article: &Article) -> [String; 4] {
    [
        article.source.clone(),
        article.title.clone(),
        hyperlink(&article.link),
        article.matched_keywords.join(", "),
    ]
}

/// Write the header and one row per article to `w`.
pub fn write_articles_to<W: Write>(mut w: W, articles: &[Article]) -> io::Result<()> {
    write_row(&mut w, &HEADER)?;
    for article in articles {
        write_row(&mut w, &article_row(article))?;
    }
    w.flush()
}

/// Create `path` and write the article table to it.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub async fn write_articles(path: &Path, articles: &[Article]) -> Result<(), WriteError> {
    let mut buf = Vec::new();
    write_articles_to(&mut buf, articles).map_err(|e| WriteError::io(path, e))?;
    fs::write(path, buf).await.map_err(|e| WriteError::io(path, e))?;
    info!("Wrote articles CSV");
    Ok(())
}

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant).
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // escaped quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Read back a file produced by [`write_articles_to`].
///
/// The header row is skipped, the link is extracted from the hyperlink formula
/// and keywords are split on `", "`.
pub fn read_articles(text: &str) -> Vec<Article> {
    parse_rows(text)
        .into_iter()
        .skip(1)
        .map(|row| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
            let link = hyperlink_target(&cell(2)).unwrap_or_default();
            let keywords = cell(3);
            let mut article = Article::new(cell(1), link, cell(0));
            article.matched_keywords = if keywords.is_empty() {
                Vec::new()
            } else {
                keywords.split(", ").map(str::to_string).collect()
            };
            article
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Article> {
        let mut a = Article::new("AI, robots and \"jobs\"", "https://example.com/ai?x=1&y=2", "Example");
        a.matched_keywords = vec!["AI".into(), "robots".into()];
        let b = Article::new("Multi\nline", "https://other.org/b", "other.org");
        vec![a, b, Article::placeholder()]
    }

    #[test]
    fn test_hyperlink_formula() {
        assert_eq!(
            hyperlink("https://example.com/a"),
            r#"=HYPERLINK("https://example.com/a", "https://example.com/a")"#
        );
        assert_eq!(hyperlink(""), "");
        assert_eq!(
            hyperlink_target(r#"=HYPERLINK("https://example.com/a", "Link")"#).as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            hyperlink_target(r#"=HYPERLINK("https://example.com/a")"#).as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(hyperlink_target("https://example.com/a"), None);
    }

    #[test]
    fn test_write_row_quoting() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["plain", "with,comma", "with \"quote\""]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "plain,\"with,comma\",\"with \"\"quote\"\"\"\n"
        );
    }

    #[test]
    fn test_header_and_rows() {
        let mut buf = Vec::new();
        write_articles_to(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Source,Title,Link,Keywords"));
        assert!(text.ends_with("Unknown,Placeholder Article,,\n"));
    }

    #[tokio::test]
    async fn test_written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let articles = sample();
        write_articles(&path, &articles).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back = read_articles(&text);

        assert_eq!(back.len(), articles.len());
        for (orig, read) in articles.iter().zip(&back) {
            assert_eq!(read.title, orig.title);
            assert_eq!(read.link, orig.link);
            assert_eq!(read.source, orig.source);
            assert_eq!(read.matched_keywords, orig.matched_keywords);
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("articles.csv");
        let err = write_articles(&path, &sample()).await.unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }

    #[test]
    fn test_parse_rows_crlf_and_quotes() {
        let rows = parse_rows("a,b\r\n\"x,y\",\"say \"\"hi\"\"\"\r\n\r\nlast,row");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x,y".to_string(), "say \"hi\"".to_string()],
                vec!["last".to_string(), "row".to_string()],
            ]
        );
    }
}
