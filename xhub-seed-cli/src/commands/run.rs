//! Run command - apply the migration files

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Color};
use tracing::warn;
use xhub_seed_core::{FailurePolicy, FileStatus, OperationResult, SeedReport, SplitMode};

use super::{get_history, load_config};
use crate::output;

/// Printed after every completed run
const SUMMARY: &[&str] = &[
    "Summary:",
    "- Basic tables created",
    "- Security functions and procedures created (where supported)",
    "- Initial roles and users seeded",
    "",
    "Default users created:",
    "- admin@xhub.local / admin123 (Admin)",
    "- user@xhub.local / user123 (User)",
];

pub struct RunArgs {
    pub fail_fast: bool,
    pub lexical: bool,
    pub database: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
    pub json: bool,
}

pub fn run(project_dir: &Path, args: RunArgs) -> Result<()> {
    let mut config = load_config(project_dir)?;
    if args.fail_fast {
        config.failure_policy = FailurePolicy::FailFast;
    }
    if args.lexical {
        config.split_mode = SplitMode::Lexical;
    }
    if let Some(database) = &args.database {
        config.set_database_path(database);
    }
    if let Some(dir) = &args.migrations_dir {
        config.set_migrations_dir(dir);
    }

    let history = get_history(&config);
    let started_at = Utc::now().timestamp_millis();

    if !args.json {
        output::info("Starting XHub database seeding...");
    }

    match xhub_seed_core::seed(&config) {
        Ok(report) => {
            if let Some(history) = &history {
                if let Err(e) = history.record_completed(&report) {
                    warn!("Could not record run history: {}", e);
                }
            }

            if args.json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&report))?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(history) = &history {
                if let Err(record_err) =
                    history.record_aborted(started_at, config.failure_policy, &e.to_string())
                {
                    warn!("Could not record run history: {}", record_err);
                }
            }

            if args.json {
                let result: OperationResult<SeedReport> = OperationResult::fail(e.to_string());
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Err(anyhow::Error::new(e).context("Database seeding failed"))
        }
    }
}

fn print_report(report: &SeedReport) {
    let mut table = output::table(vec!["File", "Status", "Executed", "Skipped", "Failed"]);

    for file in &report.files {
        let status = match file.status {
            FileStatus::Applied => Cell::new("applied").fg(Color::Green),
            FileStatus::Missing => Cell::new("missing").fg(Color::Yellow),
        };
        let failed = if file.failed.is_empty() {
            Cell::new(0)
        } else {
            Cell::new(file.failed.len()).fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&file.name),
            status,
            Cell::new(file.executed),
            Cell::new(file.skipped.len()),
            failed,
        ]);
    }

    println!();
    println!("{}", table);
    println!();

    if report.has_failures() {
        output::warning(&format!(
            "{} statement(s) failed and were skipped; the schema may be only partially applied.",
            report.failed()
        ));
        println!();
    }

    output::success("Database seeding completed successfully!");
    println!();
    for line in SUMMARY {
        println!("{}", line);
    }
    println!();
    println!("{}", "IMPORTANT: Change default passwords in production!".bold().red());
}
