//! Configuration management
//!
//! Settings live in an optional `seed.json` in the project directory:
//! ```json
//! {
//!   "databasePath": "xhub.duckdb",
//!   "migrationsDir": "migrations",
//!   "migrationFiles": ["001_create_basic_tables.sql", "..."],
//!   "failurePolicy": "bestEffort",
//!   "splitMode": "naive",
//!   "previewLength": 50,
//!   "extraSkipKeywords": [],
//!   "stateDir": ".xhub-seed"
//! }
//! ```
//! Every key is optional. Relative paths are resolved against the project
//! directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Denylist, FailurePolicy, MigrationPlan, SplitMode, DEFAULT_MIGRATION_FILES,
    DEFAULT_PREVIEW_LEN,
};
use crate::services::SeedOptions;

pub const SETTINGS_FILE: &str = "seed.json";

const DEFAULT_DATABASE_PATH: &str = "xhub.duckdb";
const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
const DEFAULT_STATE_DIR: &str = ".xhub-seed";

/// Raw seed.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migrations_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migration_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure_policy: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    split_mode: Option<SplitMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preview_length: Option<usize>,
    #[serde(default)]
    extra_skip_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state_dir: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Resolved seeding configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub database_path: PathBuf,
    pub migrations_dir: PathBuf,
    pub migration_files: Vec<String>,
    pub failure_policy: FailurePolicy,
    pub split_mode: SplitMode,
    pub preview_len: usize,
    pub extra_skip_keywords: Vec<String>,
    pub state_dir: PathBuf,
    // Keep unknown keys for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the project directory
    ///
    /// Environment overrides (for CI/testing):
    /// `XHUB_DATABASE_PATH`, `XHUB_MIGRATIONS_DIR`, `XHUB_FAILURE_POLICY`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let settings_path = project_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("invalid {}: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        Self::from_settings(project_dir, raw, |key| std::env::var(key).ok())
    }

    fn from_settings(
        project_dir: &Path,
        raw: SettingsFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let project_dir = absolute(project_dir);

        let database_path = env("XHUB_DATABASE_PATH")
            .or_else(|| raw.database_path.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let migrations_dir = env("XHUB_MIGRATIONS_DIR")
            .or_else(|| raw.migrations_dir.clone())
            .unwrap_or_else(|| DEFAULT_MIGRATIONS_DIR.to_string());
        let failure_policy = match env("XHUB_FAILURE_POLICY") {
            Some(value) => value.parse()?,
            None => raw.failure_policy.unwrap_or_default(),
        };

        let migration_files = raw
            .migration_files
            .clone()
            .unwrap_or_else(|| DEFAULT_MIGRATION_FILES.iter().map(|f| f.to_string()).collect());
        if migration_files.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::config("migrationFiles contains an empty name"));
        }

        let preview_len = raw.preview_length.unwrap_or(DEFAULT_PREVIEW_LEN);
        if preview_len == 0 {
            return Err(Error::config("previewLength must be greater than zero"));
        }

        let state_dir = raw
            .state_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());

        Ok(Self {
            database_path: resolve(&project_dir, Path::new(&database_path)),
            migrations_dir: resolve(&project_dir, Path::new(&migrations_dir)),
            state_dir: resolve(&project_dir, Path::new(&state_dir)),
            migration_files,
            failure_policy,
            split_mode: raw.split_mode.unwrap_or_default(),
            preview_len,
            extra_skip_keywords: raw.extra_skip_keywords.clone(),
            project_dir,
            _raw_settings: raw,
        })
    }

    /// Save config to the project directory
    ///
    /// Preserves keys this tool does not manage.
    pub fn save(&self) -> Result<PathBuf> {
        let settings_path = self.project_dir.join(SETTINGS_FILE);

        let mut settings = self._raw_settings.clone();
        settings.database_path = Some(relative_display(&self.project_dir, &self.database_path));
        settings.migrations_dir = Some(relative_display(&self.project_dir, &self.migrations_dir));
        settings.migration_files = Some(self.migration_files.clone());
        settings.failure_policy = Some(self.failure_policy);
        settings.split_mode = Some(self.split_mode);
        settings.preview_length = Some(self.preview_len);
        settings.extra_skip_keywords = self.extra_skip_keywords.clone();
        settings.state_dir = Some(relative_display(&self.project_dir, &self.state_dir));

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(settings_path)
    }

    /// Override the database path (relative paths resolve against the
    /// current directory, like any command-line path)
    pub fn set_database_path(&mut self, path: &Path) {
        self.database_path = absolute(path);
    }

    /// Override the migrations directory
    pub fn set_migrations_dir(&mut self, path: &Path) {
        self.migrations_dir = absolute(path);
    }

    /// Ordered migration files resolved against the migrations directory
    pub fn plan(&self) -> MigrationPlan {
        MigrationPlan::new(&self.migrations_dir, &self.migration_files)
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::with_extra(self.extra_skip_keywords.iter().cloned())
    }

    pub fn seed_options(&self) -> SeedOptions {
        SeedOptions {
            policy: self.failure_policy,
            split_mode: self.split_mode,
            preview_len: self.preview_len,
            denylist: self.denylist(),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        absolute(&base.join(path))
    }
}

fn relative_display(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_settings(dir.path(), SettingsFile::default(), |_| None).unwrap();

        assert_eq!(config.database_path, absolute(dir.path()).join("xhub.duckdb"));
        assert_eq!(config.migrations_dir, absolute(dir.path()).join("migrations"));
        assert_eq!(config.migration_files.len(), 4);
        assert_eq!(config.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(config.split_mode, SplitMode::Naive);
        assert_eq!(config.preview_len, 50);
        assert!(config.database_path.is_absolute());
    }

    #[test]
    fn test_settings_file_values() {
        let raw: SettingsFile = serde_json::from_str(
            r#"{
                "databasePath": "/var/lib/xhub/seed.duckdb",
                "migrationsDir": "db/sql",
                "migrationFiles": ["b.sql", "a.sql"],
                "failurePolicy": "failFast",
                "splitMode": "lexical",
                "previewLength": 20,
                "extraSkipKeywords": ["LOCK TABLES"]
            }"#,
        )
        .unwrap();
        let dir = tempdir().unwrap();
        let config = Config::from_settings(dir.path(), raw, |_| None).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/xhub/seed.duckdb"));
        assert_eq!(config.migrations_dir, absolute(dir.path()).join("db/sql"));
        assert_eq!(config.migration_files, vec!["b.sql", "a.sql"]);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.split_mode, SplitMode::Lexical);
        assert_eq!(config.preview_len, 20);
        assert!(config.denylist().is_denied("LOCK TABLES users WRITE"));

        let plan = config.plan();
        assert_eq!(plan.files[0].path, absolute(dir.path()).join("db/sql/b.sql"));
    }

    #[test]
    fn test_env_overrides_settings() {
        let raw: SettingsFile =
            serde_json::from_str(r#"{"failurePolicy": "bestEffort", "migrationsDir": "a"}"#)
                .unwrap();
        let dir = tempdir().unwrap();
        let config = Config::from_settings(dir.path(), raw, |key| match key {
            "XHUB_FAILURE_POLICY" => Some("fail-fast".to_string()),
            "XHUB_MIGRATIONS_DIR" => Some("/opt/migrations".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.migrations_dir, PathBuf::from("/opt/migrations"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        let bad_policy = Config::from_settings(dir.path(), SettingsFile::default(), |key| {
            (key == "XHUB_FAILURE_POLICY").then(|| "never".to_string())
        });
        assert!(matches!(bad_policy, Err(Error::Config(_))));

        let raw: SettingsFile = serde_json::from_str(r#"{"previewLength": 0}"#).unwrap();
        assert!(Config::from_settings(dir.path(), raw, |_| None).is_err());
    }

    #[test]
    fn test_malformed_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"owner": "platform-team", "previewLength": 30}"#,
        )
        .unwrap();

        let raw: SettingsFile =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap())
                .unwrap();
        let mut config = Config::from_settings(dir.path(), raw, |_| None).unwrap();
        config.failure_policy = FailurePolicy::FailFast;
        config.save().unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["owner"], "platform-team");
        assert_eq!(saved["previewLength"], 30);
        assert_eq!(saved["failurePolicy"], "failFast");
        assert_eq!(saved["migrationsDir"], "migrations");
    }
}
