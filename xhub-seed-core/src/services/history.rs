//! History service - one record per seeding run
//!
//! Runs are stored in `seed_history.duckdb` inside the state directory,
//! never in the database being seeded. Statement text is not stored, only
//! counts and the abort reason.

use std::path::{Path, PathBuf};

use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{FailurePolicy, SeedReport};
use crate::history_migrations::HISTORY_MIGRATIONS;
use crate::services::MigrationService;

const HISTORY_DB_FILE: &str = "seed_history.duckdb";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Aborted,
}

impl RunOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Aborted => "aborted",
        }
    }

    fn parse(s: &str) -> Self {
        if s == "completed" {
            RunOutcome::Completed
        } else {
            RunOutcome::Aborted
        }
    }
}

/// A run as stored in the history database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub outcome: RunOutcome,
    pub policy: String,
    pub files_total: i64,
    pub files_missing: i64,
    pub executed: i64,
    pub skipped: i64,
    pub failed: i64,
    pub error_message: Option<String>,
    pub app_version: String,
}

/// Service recording seeding runs
pub struct HistoryService {
    conn: Connection,
    db_path: PathBuf,
    app_version: String,
}

impl HistoryService {
    /// Open or create the history database in `state_dir`
    pub fn new(state_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let db_path = state_dir.join(HISTORY_DB_FILE);
        let conn = Connection::open(&db_path)?;

        let migrations = MigrationService::new(&conn, HISTORY_MIGRATIONS).run_pending()?;
        if !migrations.applied.is_empty() {
            debug!(
                "History schema: applied {} ({} already present)",
                migrations.applied.join(", "),
                migrations.already_applied
            );
        }

        Ok(Self {
            conn,
            db_path,
            app_version: app_version.into(),
        })
    }

    /// Record a run that reached the end of its file list
    pub fn record_completed(&self, report: &SeedReport) -> Result<()> {
        self.insert(&RunRecord {
            run_id: report.run_id.to_string(),
            started_at: report.started_at.timestamp_millis(),
            finished_at: report.finished_at.timestamp_millis(),
            outcome: RunOutcome::Completed,
            policy: report.policy.as_str().to_string(),
            files_total: report.files.len() as i64,
            files_missing: report.missing_files() as i64,
            executed: report.executed() as i64,
            skipped: report.skipped() as i64,
            failed: report.failed() as i64,
            error_message: None,
            app_version: self.app_version.clone(),
        })
    }

    /// Record a run that stopped before the end of its file list
    pub fn record_aborted(
        &self,
        started_at_ms: i64,
        policy: FailurePolicy,
        error_message: &str,
    ) -> Result<()> {
        self.insert(&RunRecord {
            run_id: Uuid::new_v4().to_string(),
            started_at: started_at_ms,
            finished_at: Utc::now().timestamp_millis(),
            outcome: RunOutcome::Aborted,
            policy: policy.as_str().to_string(),
            files_total: 0,
            files_missing: 0,
            executed: 0,
            skipped: 0,
            failed: 0,
            error_message: Some(error_message.to_string()),
            app_version: self.app_version.clone(),
        })
    }

    fn insert(&self, record: &RunRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sys_seed_runs (
                run_id, started_at, finished_at, outcome, policy, files_total,
                files_missing, executed, skipped, failed, error_message, app_version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                &record.run_id,
                record.started_at,
                record.finished_at,
                record.outcome.as_str(),
                &record.policy,
                record.files_total,
                record.files_missing,
                record.executed,
                record.skipped,
                record.failed,
                &record.error_message,
                &record.app_version,
            ],
        )?;
        Ok(())
    }

    /// Most recent runs first
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT run_id, started_at, finished_at, outcome, policy, files_total,
                   files_missing, executed, skipped, failed, error_message, app_version
            FROM sys_seed_runs
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
            let outcome: String = row.get(3)?;
            Ok(RunRecord {
                run_id: row.get(0)?,
                started_at: row.get(1)?,
                finished_at: row.get(2)?,
                outcome: RunOutcome::parse(&outcome),
                policy: row.get(4)?,
                files_total: row.get(5)?,
                files_missing: row.get(6)?,
                executed: row.get(7)?,
                skipped: row.get(8)?,
                failed: row.get(9)?,
                error_message: row.get(10)?,
                app_version: row.get(11)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sys_seed_runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
