//! Check command - dry run of statement splitting and filtering

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use serde::Serialize;
use xhub_seed_core::domain::{StatementStream, Verdict};
use xhub_seed_core::SplitMode;

use super::load_config;
use crate::output;

#[derive(Serialize)]
struct CheckedStatement {
    ordinal: usize,
    #[serde(flatten)]
    verdict: Verdict,
    preview: String,
}

pub fn run(project_dir: &Path, file: &Path, lexical: bool, json: bool) -> Result<()> {
    let config = load_config(project_dir)?;
    let sql = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read SQL file: {:?}", file))?;

    let mode = if lexical { SplitMode::Lexical } else { config.split_mode };
    let denylist = config.denylist();

    let statements: Vec<CheckedStatement> = StatementStream::new(&sql, mode, &denylist)
        .with_preview_len(config.preview_len)
        .map(|s| CheckedStatement {
            ordinal: s.ordinal,
            preview: s.preview(config.preview_len),
            verdict: s.verdict,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
        return Ok(());
    }

    let mut table = output::table(vec!["#", "Action", "Statement"]);
    for statement in &statements {
        let action = match &statement.verdict {
            Verdict::Execute => Cell::new("execute").fg(Color::Green),
            Verdict::Skip { keyword } => Cell::new(format!("skip ({})", keyword)).fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(statement.ordinal),
            action,
            Cell::new(&statement.preview),
        ]);
    }
    println!("{}", table);

    let skipped = statements
        .iter()
        .filter(|s| matches!(s.verdict, Verdict::Skip { .. }))
        .count();
    println!();
    println!(
        "{} statement(s): {} to execute, {} skipped",
        statements.len(),
        statements.len() - skipped,
        skipped
    );

    Ok(())
}
