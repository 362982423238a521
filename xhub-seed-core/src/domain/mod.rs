//! Core domain types
//!
//! Pure data structures and the statement splitting/filtering logic.
//! No database access happens here.

pub mod denylist;
mod migration;
mod report;
pub mod result;
pub mod statement;

pub use denylist::{Denylist, DEFAULT_SKIP_KEYWORDS};
pub use migration::{MigrationFile, MigrationPlan, DEFAULT_MIGRATION_FILES};
pub use report::{
    FailurePolicy, FileReport, FileStatus, SeedReport, SkippedStatement, StatementFailure,
};
pub use statement::{
    preview, split_statements, split_statements_lexical, SplitMode, Statement, StatementStream,
    Verdict, DEFAULT_PREVIEW_LEN,
};
