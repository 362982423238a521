//! Seed service - applies migration files statement by statement
//!
//! Files are processed in plan order and statements in source order, one at
//! a time, through a single executor. Failure handling:
//!
//! - missing file: warning, the next file is processed
//! - unreadable file: the run aborts with [`Error::ReadMigration`]
//! - rejected statement: warning and continue ([`FailurePolicy::BestEffort`])
//!   or abort with [`Error::StatementFailed`] ([`FailurePolicy::FailFast`])

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Denylist, FailurePolicy, FileReport, MigrationFile, MigrationPlan, SeedReport,
    SkippedStatement, SplitMode, StatementFailure, StatementStream, Verdict, DEFAULT_PREVIEW_LEN,
};
use crate::ports::StatementExecutor;

/// Knobs for a seeding run
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub policy: FailurePolicy,
    pub split_mode: SplitMode,
    pub preview_len: usize,
    pub denylist: Denylist,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            split_mode: SplitMode::default(),
            preview_len: DEFAULT_PREVIEW_LEN,
            denylist: Denylist::default(),
        }
    }
}

/// Service that runs a [`MigrationPlan`] against one executor
pub struct SeedService<E: StatementExecutor> {
    executor: E,
    options: SeedOptions,
}

impl<E: StatementExecutor> SeedService<E> {
    pub fn new(executor: E, options: SeedOptions) -> Self {
        Self { executor, options }
    }

    /// Apply every file of the plan
    ///
    /// Returns a report once the end of the file list is reached, whatever
    /// the number of skipped or failed statements.
    pub fn run(&mut self, plan: &MigrationPlan) -> Result<SeedReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Seeding {} migration file(s) from {} ({})",
            plan.len(),
            plan.migrations_dir.display(),
            self.options.policy.as_str()
        );

        let mut files = Vec::with_capacity(plan.len());
        for file in &plan.files {
            if !file.exists() {
                warn!("Migration file not found: {}", file.path.display());
                files.push(FileReport::missing(&file.name, file.path.clone()));
                continue;
            }
            files.push(self.run_file(file)?);
        }

        Ok(SeedReport {
            run_id,
            policy: self.options.policy,
            started_at,
            finished_at: Utc::now(),
            files,
        })
    }

    /// Apply a single file
    pub fn run_file(&mut self, file: &MigrationFile) -> Result<FileReport> {
        info!("Executing SQL file: {}", file.path.display());

        let sql = std::fs::read_to_string(&file.path).map_err(|source| {
            error!("Error executing {}: {}", file.path.display(), source);
            Error::ReadMigration {
                path: file.path.clone(),
                source,
            }
        })?;

        let mut report = FileReport::applied(&file.name, file.path.clone(), checksum(&sql));
        let preview_len = self.options.preview_len;
        let stream = StatementStream::new(&sql, self.options.split_mode, &self.options.denylist)
            .with_preview_len(preview_len);

        for statement in stream {
            if let Verdict::Skip { keyword } = &statement.verdict {
                report.skipped.push(SkippedStatement {
                    ordinal: statement.ordinal,
                    preview: statement.preview(preview_len),
                    keyword: keyword.clone(),
                });
                continue;
            }

            match self.executor.execute(&statement.text) {
                Ok(()) => report.executed += 1,
                Err(e) => {
                    let preview = statement.preview(preview_len);
                    let message = engine_message(&e);
                    warn!("Could not execute statement: {}", preview);
                    warn!("Error: {}", message);

                    if self.options.policy == FailurePolicy::FailFast {
                        error!("Aborting {}: fail-fast policy", file.path.display());
                        return Err(Error::StatementFailed {
                            file: file.name.clone(),
                            ordinal: statement.ordinal,
                            preview,
                            message,
                        });
                    }

                    report.failed.push(StatementFailure {
                        ordinal: statement.ordinal,
                        preview,
                        message,
                    });
                }
            }
        }

        info!(
            "Completed: {} ({} executed, {} skipped, {} failed)",
            file.path.display(),
            report.executed,
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Give the executor back, typically to close it
    pub fn into_executor(self) -> E {
        self.executor
    }
}

/// Hex SHA-256 of a migration file's contents
fn checksum(sql: &str) -> String {
    format!("{:x}", Sha256::digest(sql.as_bytes()))
}

/// Message reported by the database, without our variant prefix
fn engine_message(err: &Error) -> String {
    match err {
        Error::Database(msg) => msg.clone(),
        other => other.to_string(),
    }
}
