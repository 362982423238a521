//! History command - recent seeding runs

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color};
use xhub_seed_core::{HistoryService, RunOutcome};

use super::load_config;
use crate::output;

pub fn run(project_dir: &Path, limit: usize, json: bool) -> Result<()> {
    let config = load_config(project_dir)?;
    let history = HistoryService::new(&config.state_dir, env!("CARGO_PKG_VERSION"))?;
    let runs = history.recent(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No seeding runs recorded.");
        return Ok(());
    }

    let mut table = output::table(vec![
        "Started", "Outcome", "Policy", "Executed", "Skipped", "Failed", "Missing", "Error",
    ]);

    for record in &runs {
        let outcome = match record.outcome {
            RunOutcome::Completed if record.failed > 0 => Cell::new("completed").fg(Color::Yellow),
            RunOutcome::Completed => Cell::new("completed").fg(Color::Green),
            RunOutcome::Aborted => Cell::new("aborted").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(output::format_timestamp(record.started_at)),
            outcome,
            Cell::new(&record.policy),
            Cell::new(record.executed),
            Cell::new(record.skipped),
            Cell::new(record.failed),
            Cell::new(record.files_missing),
            Cell::new(record.error_message.as_deref().unwrap_or("")),
        ]);
    }

    println!("{}", table);
    println!();
    println!("History database: {}", history.db_path().display());

    Ok(())
}
