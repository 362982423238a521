//! Executor port - raw SQL execution abstraction

use crate::domain::result::Result;

/// Executes one raw SQL statement at a time
///
/// The runner only ever holds one executor and calls it sequentially.
/// Implementations own the underlying connection.
pub trait StatementExecutor {
    /// Execute a single statement. The text never contains the `;`
    /// terminator.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Release the underlying connection
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for &mut E {
    fn execute(&mut self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }
}
