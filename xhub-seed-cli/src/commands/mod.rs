//! CLI command implementations

pub mod check;
pub mod history;
pub mod init;
pub mod plan;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use xhub_seed_core::config::Config;
use xhub_seed_core::HistoryService;

/// Project directory from the flag/env var, or the current directory
pub fn get_project_dir(arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Could not determine the current directory"),
    }
}

/// Load seed.json (if any) from the project directory
pub fn load_config(project_dir: &Path) -> Result<Config> {
    Config::load(project_dir)
        .with_context(|| format!("Failed to load configuration from {:?}", project_dir))
}

/// Open the run history
///
/// Returns None if it cannot be opened (history should never block seeding)
pub fn get_history(config: &Config) -> Option<HistoryService> {
    match HistoryService::new(&config.state_dir, env!("CARGO_PKG_VERSION")) {
        Ok(history) => Some(history),
        Err(e) => {
            warn!("Run history unavailable: {}", e);
            None
        }
    }
}
