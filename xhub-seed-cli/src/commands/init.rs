//! Init command - write seed.json with the default settings

use std::path::Path;

use anyhow::{bail, Result};
use xhub_seed_core::config::SETTINGS_FILE;

use super::load_config;
use crate::output;

pub fn run(project_dir: &Path, force: bool) -> Result<()> {
    if project_dir.join(SETTINGS_FILE).exists() && !force {
        bail!("{} already exists. Use --force to overwrite it.", SETTINGS_FILE);
    }

    std::fs::create_dir_all(project_dir)?;
    let config = load_config(project_dir)?;
    let path = config.save()?;

    output::success(&format!("Wrote {}", path.display()));
    println!("Migrations are read from {}", config.migrations_dir.display());
    Ok(())
}
