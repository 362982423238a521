//! Structured outcome of a seeding run

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::Error;

/// What to do when a statement is rejected by the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Log the failure and continue with the next statement
    #[default]
    BestEffort,
    /// Abort the run on the first failed statement
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::BestEffort => "best-effort",
            FailurePolicy::FailFast => "fail-fast",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "besteffort" => Ok(FailurePolicy::BestEffort),
            "failfast" => Ok(FailurePolicy::FailFast),
            _ => Err(Error::config(format!("unknown failure policy: {}", s))),
        }
    }
}

/// Whether a migration file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Applied,
    Missing,
}

/// A statement the database rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFailure {
    pub ordinal: usize,
    pub preview: String,
    pub message: String,
}

/// A statement filtered out before execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStatement {
    pub ordinal: usize,
    pub preview: String,
    pub keyword: String,
}

/// Per-file results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    pub status: FileStatus,
    /// SHA-256 of the file contents, hex encoded
    pub checksum: Option<String>,
    pub executed: usize,
    pub skipped: Vec<SkippedStatement>,
    pub failed: Vec<StatementFailure>,
}

impl FileReport {
    pub fn missing(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path,
            status: FileStatus::Missing,
            checksum: None,
            executed: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn applied(name: &str, path: PathBuf, checksum: String) -> Self {
        Self {
            status: FileStatus::Applied,
            checksum: Some(checksum),
            ..Self::missing(name, path)
        }
    }

    /// Statements handed to the database, successful or not
    pub fn attempted(&self) -> usize {
        self.executed + self.failed.len()
    }
}

/// Result of a completed seeding run
///
/// A run counts as completed once the end of the file list is reached,
/// even when some statements failed. Check [`SeedReport::has_failures`]
/// for partial application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    pub run_id: Uuid,
    pub policy: FailurePolicy,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: Vec<FileReport>,
}

impl SeedReport {
    pub fn executed(&self) -> usize {
        self.files.iter().map(|f| f.executed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().map(|f| f.failed.len()).sum()
    }

    pub fn missing_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Missing)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
