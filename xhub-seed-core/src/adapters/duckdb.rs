//! DuckDB executor implementation

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use duckdb::Connection;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::ports::StatementExecutor;

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Single DuckDB connection used for a whole seeding run
///
/// The connection is released by [`DuckDbExecutor::close`] or, if that is
/// never reached, when the executor is dropped.
pub struct DuckDbExecutor {
    conn: Option<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbExecutor {
    /// Open (or create) the database file
    ///
    /// Retries with exponential backoff while another process holds the
    /// file lock.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    debug!("Opened database {}", db_path.display());
                    return Ok(Self {
                        conn: Some(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            "Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(Error::database(format!(
                        "failed to open {}: {}",
                        db_path.display(),
                        err_msg
                    )));
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Some(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> std::result::Result<Connection, duckdb::Error> {
        // Extension autoloading stays off: seeding never needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::database("connection already closed"))
    }
}

impl StatementExecutor for DuckDbExecutor {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| Error::from(e)),
            None => Ok(()),
        }
    }
}

impl Drop for DuckDbExecutor {
    fn drop(&mut self) {
        if self.conn.take().is_some() {
            debug!("Database connection released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_retryable_error_detection() {
        assert!(is_retryable_error("IO Error: Could not set lock on file: Resource temporarily unavailable"));
        assert!(is_retryable_error("The process cannot access the file because it is being used by another process"));
        assert!(!is_retryable_error("Catalog Error: Table with name users does not exist!"));
    }

    #[test]
    fn test_execute_and_close_in_memory() {
        let mut executor = DuckDbExecutor::open_in_memory().unwrap();
        executor.execute("CREATE TABLE users (id INTEGER, email VARCHAR)").unwrap();
        executor.execute("INSERT INTO users VALUES (1, 'admin@xhub.local')").unwrap();
        assert!(executor.db_path().is_none());
        executor.close().unwrap();
    }

    #[test]
    fn test_execute_reports_engine_errors() {
        let mut executor = DuckDbExecutor::open_in_memory().unwrap();
        let err = executor.execute("INSERT INTO missing_table VALUES (1)").unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_open_creates_database_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("xhub.duckdb");

        let mut executor = DuckDbExecutor::open(&db_path).unwrap();
        executor.execute("CREATE TABLE t (id INTEGER)").unwrap();
        executor.close().unwrap();

        assert!(db_path.exists());
    }

    #[test]
    fn test_open_reports_unusable_parent_directory() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = DuckDbExecutor::open(&blocker.join("db").join("xhub.duckdb"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
