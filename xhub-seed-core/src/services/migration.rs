//! Migration service - manages schema migrations of internal databases
//!
//! Migrations are SQL files embedded at compile time. Each one is tracked
//! in the sys_migrations table so it runs exactly once. The first entry of
//! the list must create sys_migrations itself.

use duckdb::Connection;

use crate::domain::result::{Error, Result};

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for applying an embedded migration list to a connection
pub struct MigrationService<'a> {
    conn: &'a Connection,
    migrations: &'static [(&'static str, &'static str)],
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection, migrations: &'static [(&'static str, &'static str)]) -> Self {
        Self { conn, migrations }
    }

    /// Run all pending migrations
    ///
    /// 1. Bootstraps sys_migrations with the first migration if needed
    /// 2. Applies the remaining pending migrations in order
    /// 3. Records each applied migration
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let (bootstrap_name, bootstrap_sql) = self
            .migrations
            .first()
            .ok_or_else(|| Error::database("empty migration list"))?;

        let mut newly_applied = Vec::new();

        if !self.migrations_table_exists()? {
            self.conn.execute_batch(bootstrap_sql)?;
            self.record_migration(bootstrap_name)?;
            newly_applied.push(bootstrap_name.to_string());
        }

        let applied_set = self.get_applied()?;
        let already_applied = applied_set.len().saturating_sub(newly_applied.len());

        for (name, sql) in self.migrations.iter().skip(1) {
            if !applied_set.iter().any(|a| a == name) {
                self.conn.execute_batch(sql)?;
                self.record_migration(name)?;
                newly_applied.push(name.to_string());
            }
        }

        Ok(MigrationResult {
            applied: newly_applied,
            already_applied,
        })
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let result: std::result::Result<i64, _> = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        );

        Ok(matches!(result, Ok(count) if count > 0))
    }

    /// Get list of already applied migration names
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for name in names {
            result.push(name?);
        }
        Ok(result)
    }

    fn record_migration(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history_migrations::HISTORY_MIGRATIONS;

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn, HISTORY_MIGRATIONS);

        let result = service.run_pending().unwrap();
        assert_eq!(result.applied.len(), HISTORY_MIGRATIONS.len());
        assert_eq!(result.already_applied, 0);

        // Running again should apply nothing
        let result2 = service.run_pending().unwrap();
        assert!(result2.applied.is_empty());
        assert_eq!(result2.already_applied, HISTORY_MIGRATIONS.len());
    }

    #[test]
    fn test_empty_migration_list_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn, &[]);
        assert!(service.run_pending().is_err());
    }
}
