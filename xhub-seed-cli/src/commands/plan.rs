//! Plan command - list the migration files in application order

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color};
use serde::Serialize;

use super::load_config;
use crate::output;

#[derive(Serialize)]
struct PlanEntry<'a> {
    position: usize,
    name: &'a str,
    path: &'a Path,
    exists: bool,
}

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    let config = load_config(project_dir)?;
    let plan = config.plan();

    let entries: Vec<PlanEntry> = plan
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| PlanEntry {
            position: i + 1,
            name: &file.name,
            path: &file.path,
            exists: file.exists(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Database:   {}", config.database_path.display());
    println!("Migrations: {}", plan.migrations_dir.display());
    println!(
        "Policy:     {} ({:?} split)",
        config.failure_policy.as_str(),
        config.split_mode
    );
    println!();

    let mut table = output::table(vec!["#", "File", "Found"]);
    for entry in &entries {
        let found = if entry.exists {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("missing").fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(entry.position), Cell::new(entry.name), found]);
    }
    println!("{}", table);

    let missing = entries.iter().filter(|e| !e.exists).count();
    if missing > 0 {
        println!();
        output::warning(&format!(
            "{} file(s) not found; they will be skipped with a warning.",
            missing
        ));
    }

    Ok(())
}
