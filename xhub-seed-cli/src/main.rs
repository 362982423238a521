//! XHub seed CLI - apply SQL migration files to the XHub database

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{check, history, init, plan, run};

/// XHub database seeding
#[derive(Parser)]
#[command(name = "xhub-seed", version, about, long_about = None)]
struct Cli {
    /// Project directory containing seed.json and the migrations folder
    #[arg(long, global = true, env = "XHUB_SEED_DIR")]
    project_dir: Option<PathBuf>,

    /// Show debug log lines
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the migration files in order
    Run {
        /// Abort on the first statement the database rejects
        #[arg(long)]
        fail_fast: bool,
        /// Split statements with a SQL tokenizer instead of on every `;`
        #[arg(long)]
        lexical: bool,
        /// Database file to seed
        #[arg(long)]
        database: Option<PathBuf>,
        /// Directory holding the migration files
        #[arg(long)]
        migrations_dir: Option<PathBuf>,
        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the migration files that would be applied
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a SQL file is split and filtered, without executing it
    Check {
        /// SQL file to inspect
        file: PathBuf,
        /// Split statements with a SQL tokenizer instead of on every `;`
        #[arg(long)]
        lexical: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent seeding runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a seed.json with the default settings
    Init {
        /// Overwrite an existing seed.json
        #[arg(long, short)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Log lines go to stderr so `--json` output stays clean on stdout
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let project_dir = commands::get_project_dir(cli.project_dir)?;

    match cli.command {
        Commands::Run { fail_fast, lexical, database, migrations_dir, json } => run::run(
            &project_dir,
            run::RunArgs { fail_fast, lexical, database, migrations_dir, json },
        ),
        Commands::Plan { json } => plan::run(&project_dir, json),
        Commands::Check { file, lexical, json } => check::run(&project_dir, &file, lexical, json),
        Commands::History { limit, json } => history::run(&project_dir, limit, json),
        Commands::Init { force } => init::run(&project_dir, force),
    }
}
