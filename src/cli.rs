//! CLI argument parsing for the rectification pipeline.
//!
//! The CLI only routes; every command reads the same config file and the
//! results table it points at.
use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "rectify",
    version,
    about = "Mine bug-fix commits and rewrite, score, and classify their messages",
    after_help = "Commands:\n  init                 Write a default rectify.json\n  run                  Mine, generate baselines, and analyze (resumes automatically)\n  status               Show how many rows still need work\n  report               Print score and category statistics\n\nExamples:\n  rectify init\n  rectify run --repo https://github.com/psf/requests --limit 20\n  rectify status --json\n  rectify report --results results.csv",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
    Status(StatusArgs),
    Report(ReportArgs),
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a default pipeline config")]
pub struct InitArgs {
    /// Config file to create
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Repository URL or local path to record in the new config
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Run command inputs. CLI values override the config file for this run only.
#[derive(Parser, Debug)]
#[command(about = "Run the pipeline, resuming from any existing results")]
pub struct RunArgs {
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Repository URL or local path to mine
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Stop mining after this many bug-fixing commits
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Results CSV to write (and resume from)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the summary report once the run finishes
    #[arg(long)]
    pub report: bool,

    /// Emit machine-readable JSON run summary
    #[arg(long)]
    pub json: bool,

    /// Log at debug level
    #[arg(long)]
    pub verbose: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize remaining work in a results table")]
pub struct StatusArgs {
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Results CSV to inspect instead of the configured one
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Report command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print score and improvement statistics for a results table")]
pub struct ReportArgs {
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Results CSV to report on instead of the configured one
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

impl Command {
    /// Whether debug logging was requested.
    pub fn verbose(&self) -> bool {
        matches!(self, Command::Run(args) if args.verbose)
    }
}
