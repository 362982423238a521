//! XHub seed core - applies SQL migration files to a database
//!
//! Layout follows a hexagonal architecture:
//!
//! - **domain**: statement splitting, the denylist, plans and reports
//! - **ports**: the `StatementExecutor` trait
//! - **services**: the sequential runner and the run history
//! - **adapters**: the DuckDB executor

pub mod adapters;
pub mod config;
pub mod domain;
mod history_migrations;
pub mod ports;
pub mod services;

use tracing::warn;

use adapters::DuckDbExecutor;
use config::Config;
use ports::StatementExecutor;
use services::{SeedOptions, SeedService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{
    Denylist, FailurePolicy, FileReport, FileStatus, MigrationPlan, SeedReport, SplitMode,
};
pub use services::{HistoryService, RunOutcome, RunRecord};

/// Seed the configured database with the configured migration files
///
/// Opens one connection, applies the plan and releases the connection on
/// every exit path.
pub fn seed(config: &Config) -> Result<SeedReport> {
    let executor = DuckDbExecutor::open(&config.database_path)?;
    seed_with(executor, &config.plan(), config.seed_options())
}

/// Apply `plan` through an already opened executor, then close it
///
/// A failed close after a completed run is logged and the report is still
/// returned, since every statement has already been applied.
pub fn seed_with<E: StatementExecutor>(
    executor: E,
    plan: &MigrationPlan,
    options: SeedOptions,
) -> Result<SeedReport> {
    let mut service = SeedService::new(executor, options);
    let result = service.run(plan);

    if let Err(close_err) = service.into_executor().close() {
        warn!("Failed to release database connection: {}", close_err);
    }

    result
}
