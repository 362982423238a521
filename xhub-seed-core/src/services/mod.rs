//! Service layer - orchestration
//!
//! Services coordinate domain logic and port interactions.

pub mod history;
pub mod migration;
pub mod seed;

pub use history::{HistoryService, RunOutcome, RunRecord};
pub use migration::{MigrationResult, MigrationService};
pub use seed::{SeedOptions, SeedService};
