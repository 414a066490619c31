//! Command-line interface for the `sitehomology` crate.
//!
//! Subcommands are implemented in separate files (modules) under
//! `src/bin/sitehomology/`:
//! - `score_cmd.rs`: candidate table × guides against a reference
//! - `align_cmd.rs`: one guide against one literal sequence
//!
use std::io::Write;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name="sitehomology", version=env!("CARGO_PKG_VERSION"), about="Seed-aware guide/locus homology scoring for off-target candidate sites", disable_help_subcommand=true)]
struct Cli {
    /// Log debug messages (e.g. clipped windows).
    #[arg(long, short, global=true, conflicts_with="quiet")]
    verbose: bool,
    /// Only log warnings and errors.
    #[arg(long, short, global=true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every candidate site against every guide and write a TSV table.
    Score(score_cmd::ScoreCmd),
    /// Align one guide against one sequence and print the best hit.
    Align(align_cmd::AlignCmd),
}

#[path = "sitehomology/scoring_args.rs"] mod scoring_args;
#[path = "sitehomology/score_cmd.rs"] mod score_cmd;
#[path = "sitehomology/align_cmd.rs"] mod align_cmd;

fn init_log(level: LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(buf, "{} [{}] - {}",
                     Local::now().format("%Y-%m-%dT%H:%M:%S"),
                     record.level(),
                     record.args())
        })
        .filter(None, level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { LevelFilter::Debug } else if cli.quiet { LevelFilter::Warn } else { LevelFilter::Info };
    init_log(level);
    match cli.command {
        Command::Score(cmd) => score_cmd::run(cmd),
        Command::Align(cmd) => align_cmd::run(cmd),
    }
}
