//! Splitting migration file text into statements
//!
//! Two split modes are supported:
//!
//! - **Naive**: split on every `;`. Semicolons inside string literals,
//!   comments or routine bodies break statements apart. Routines are the
//!   usual source of embedded semicolons and are denylisted anyway.
//! - **Lexical**: tokenize with `sqlparser` first and only split on
//!   semicolon tokens. Leading comments are stripped from each statement
//!   instead of discarding the statement.
//!
//! In both modes a candidate is trimmed and dropped when it is empty or
//! starts with `--` or `/*`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::{info, warn};

use super::denylist::Denylist;

/// Default number of characters shown when a statement appears in a log line
pub const DEFAULT_PREVIEW_LEN: usize = 50;

/// How file contents are split into statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitMode {
    #[default]
    Naive,
    Lexical,
}

/// Filter decision for a single statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Verdict {
    Execute,
    Skip { keyword: String },
}

/// A single candidate statement from a migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement<'a> {
    /// 1-based position among the file's candidates
    pub ordinal: usize,
    pub text: Cow<'a, str>,
    pub verdict: Verdict,
}

impl Statement<'_> {
    pub fn is_skipped(&self) -> bool {
        matches!(self.verdict, Verdict::Skip { .. })
    }

    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.text, max_chars)
    }
}

/// Truncate `text` to `max_chars` characters, appending `...` when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Whether a trimmed segment is a real statement
fn is_candidate(segment: &str) -> bool {
    !segment.is_empty() && !segment.starts_with("--") && !segment.starts_with("/*")
}

/// Lazy naive split of SQL text on `;`
///
/// Cloning the iterator restarts nothing but gives an independent cursor,
/// so the sequence can be walked again from any point.
#[derive(Debug, Clone)]
pub struct SplitStatements<'a> {
    segments: std::str::Split<'a, char>,
}

impl<'a> Iterator for SplitStatements<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.segments.by_ref().map(str::trim).find(|s| is_candidate(s))
    }
}

/// Split `sql` on `;`, dropping blanks and comment-led segments
pub fn split_statements(sql: &str) -> SplitStatements<'_> {
    SplitStatements {
        segments: sql.split(';'),
    }
}

/// Split `sql` on semicolon tokens only
///
/// Leading whitespace and comment tokens of each statement are dropped.
/// Returns an error message when the text cannot be tokenized (for example
/// an unterminated string literal).
pub fn split_statements_lexical(sql: &str) -> std::result::Result<Vec<String>, String> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| e.to_string())?;

    let mut statements = Vec::new();
    let mut current = String::new();

    for token in tokens {
        match token {
            Token::SemiColon => {
                let trimmed = current.trim();
                if is_candidate(trimmed) {
                    statements.push(trimmed.to_string());
                }
                current.clear();
            }
            Token::Whitespace(_) if current.trim().is_empty() => {
                // Comments ahead of the statement body are not part of it
                current.clear();
            }
            Token::EOF => {}
            other => current.push_str(&other.to_string()),
        }
    }

    let trimmed = current.trim();
    if is_candidate(trimmed) {
        statements.push(trimmed.to_string());
    }

    Ok(statements)
}

enum Candidates<'a> {
    Naive(SplitStatements<'a>),
    Lexical(std::vec::IntoIter<String>),
}

impl<'a> Iterator for Candidates<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Candidates::Naive(split) => split.next().map(Cow::Borrowed),
            Candidates::Lexical(iter) => iter.next().map(Cow::Owned),
        }
    }
}

/// Candidate statements of one file, each tagged with the denylist verdict
///
/// Skipped statements are still yielded (so they can be counted) and are
/// logged with a truncated preview as they pass through.
pub struct StatementStream<'a> {
    candidates: Candidates<'a>,
    denylist: &'a Denylist,
    preview_len: usize,
    ordinal: usize,
}

impl<'a> StatementStream<'a> {
    pub fn new(sql: &'a str, mode: SplitMode, denylist: &'a Denylist) -> Self {
        let candidates = match mode {
            SplitMode::Naive => Candidates::Naive(split_statements(sql)),
            SplitMode::Lexical => match split_statements_lexical(sql) {
                Ok(statements) => Candidates::Lexical(statements.into_iter()),
                Err(e) => {
                    warn!("Could not tokenize SQL ({}), falling back to naive split", e);
                    Candidates::Naive(split_statements(sql))
                }
            },
        };

        Self {
            candidates,
            denylist,
            preview_len: DEFAULT_PREVIEW_LEN,
            ordinal: 0,
        }
    }

    /// Set the preview length used in skip log lines
    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }
}

impl<'a> Iterator for StatementStream<'a> {
    type Item = Statement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.candidates.next()?;
        self.ordinal += 1;

        let verdict = match self.denylist.matched_keyword(&text) {
            Some(keyword) => {
                info!(
                    "Skipping MySQL-specific statement: {}",
                    preview(&text, self.preview_len)
                );
                Verdict::Skip {
                    keyword: keyword.trim_end().to_string(),
                }
            }
            None => Verdict::Execute,
        };

        Some(Statement {
            ordinal: self.ordinal,
            text,
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_trims_and_drops_blanks() {
        let sql = "  CREATE TABLE a (id INT);\n\n  ;  INSERT INTO a VALUES (1) ;\n";
        let statements: Vec<&str> = split_statements(sql).collect();
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[test]
    fn test_split_drops_comment_led_segments() {
        let sql = "-- header comment\nCREATE TABLE a (id INT);\n/* block */ INSERT INTO a VALUES (1);\nINSERT INTO a VALUES (2);";
        let statements: Vec<&str> = split_statements(sql).collect();
        // Both statements preceded by a comment are dropped in naive mode
        assert_eq!(statements, vec!["INSERT INTO a VALUES (2)"]);
    }

    #[test]
    fn test_split_keeps_source_order_and_duplicates() {
        let sql = "INSERT INTO t VALUES (1);INSERT INTO t VALUES (2);INSERT INTO t VALUES (1)";
        let statements: Vec<&str> = split_statements(sql).collect();
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t VALUES (1)",
                "INSERT INTO t VALUES (2)",
                "INSERT INTO t VALUES (1)"
            ]
        );
    }

    #[test]
    fn test_split_never_yields_empty_or_comment() {
        let sql = ";;-- a;/* b */;\n;  ;SELECT 1;-- trailing";
        for statement in split_statements(sql) {
            assert!(!statement.is_empty());
            assert!(!statement.starts_with("--"));
            assert!(!statement.starts_with("/*"));
        }
        assert_eq!(split_statements(sql).count(), 1);
    }

    #[test]
    fn test_split_is_restartable() {
        let sql = "SELECT 1; SELECT 2; SELECT 3";
        let mut iter = split_statements(sql);
        assert_eq!(iter.next(), Some("SELECT 1"));

        let snapshot = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), vec!["SELECT 2", "SELECT 3"]);
        assert_eq!(snapshot.collect::<Vec<_>>(), vec!["SELECT 2", "SELECT 3"]);
        assert_eq!(split_statements(sql).count(), 3);
    }

    #[test]
    fn test_naive_split_breaks_string_literals() {
        let sql = "INSERT INTO t (s) VALUES ('a;b')";
        let statements: Vec<&str> = split_statements(sql).collect();
        assert_eq!(statements, vec!["INSERT INTO t (s) VALUES ('a", "b')"]);
    }

    #[test]
    fn test_lexical_split_respects_string_literals() {
        let sql = "INSERT INTO t (s) VALUES ('a;b'); INSERT INTO t (s) VALUES ('it''s')";
        let statements = split_statements_lexical(sql).unwrap();
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t (s) VALUES ('a;b')",
                "INSERT INTO t (s) VALUES ('it''s')"
            ]
        );
    }

    #[test]
    fn test_lexical_split_strips_leading_comments() {
        let sql = "-- users\nCREATE TABLE users (id INT);\n/* seed */\nINSERT INTO users VALUES (1);\n-- trailing only";
        let statements = split_statements_lexical(sql).unwrap();
        assert_eq!(
            statements,
            vec!["CREATE TABLE users (id INT)", "INSERT INTO users VALUES (1)"]
        );
    }

    #[test]
    fn test_lexical_split_reports_unterminated_string() {
        assert!(split_statements_lexical("INSERT INTO t VALUES ('oops").is_err());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("héllo wörld", 4), "héll...");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_stream_tags_denylisted_statements() {
        let denylist = Denylist::default();
        let sql = "CREATE TRIGGER trg AFTER INSERT ON users FOR EACH ROW SET @x = 1;\nINSERT INTO users VALUES (1);";
        let statements: Vec<Statement> =
            StatementStream::new(sql, SplitMode::Naive, &denylist).collect();

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].ordinal, 1);
        assert_eq!(
            statements[0].verdict,
            Verdict::Skip {
                keyword: "CREATE TRIGGER".to_string()
            }
        );
        assert_eq!(statements[1].ordinal, 2);
        assert_eq!(statements[1].verdict, Verdict::Execute);
        assert_eq!(statements[1].text, "INSERT INTO users VALUES (1)");
    }

    #[test]
    fn test_stream_falls_back_to_naive_on_tokenizer_error() {
        let denylist = Denylist::default();
        let sql = "SELECT 1; SELECT 'unterminated";
        let count = StatementStream::new(sql, SplitMode::Lexical, &denylist).count();
        assert_eq!(count, 2);
    }
}
