use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod enrichment;
mod lm;
mod miner;
mod pipeline;
mod record;
mod report;
mod util;
mod workflow;

use cli::{Command, RootArgs};

/// Logs go to stderr so stdout stays parseable for `--json`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_logging(args.command.verbose());

    match &args.command {
        Command::Init(args) => workflow::run_init(args),
        Command::Run(args) => workflow::run_run(args),
        Command::Status(args) => workflow::run_status(args),
        Command::Report(args) => workflow::run_report(args),
    }
}
