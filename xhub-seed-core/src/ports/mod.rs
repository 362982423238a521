//! Port definitions (hexagonal architecture)
//!
//! The runner depends only on these traits, not on a concrete database.

mod executor;

pub use executor::StatementExecutor;
