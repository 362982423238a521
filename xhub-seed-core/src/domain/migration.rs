//! Ordered list of migration files to apply

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reference seeding order: base schema, stored routines,
/// roles/views/permissions, seed data.
pub const DEFAULT_MIGRATION_FILES: &[&str] = &[
    "001_create_basic_tables.sql",
    "002_create_functions_and_procedures.sql",
    "003_create_roles_views_permissions.sql",
    "004_seed_initial_data.sql",
];

/// A migration file resolved against the migrations directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFile {
    pub name: String,
    pub path: PathBuf,
}

impl MigrationFile {
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Migration files in the order they must be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub migrations_dir: PathBuf,
    pub files: Vec<MigrationFile>,
}

impl MigrationPlan {
    /// Resolve `names` against `migrations_dir`, keeping their order
    pub fn new<S: AsRef<str>>(migrations_dir: &Path, names: &[S]) -> Self {
        let files = names
            .iter()
            .map(|name| MigrationFile {
                name: name.as_ref().to_string(),
                path: migrations_dir.join(name.as_ref()),
            })
            .collect();

        Self {
            migrations_dir: migrations_dir.to_path_buf(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
