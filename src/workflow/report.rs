//! Workflow report step.
use super::{print_json, resolve_results_path};
use crate::cli::ReportArgs;
use crate::record::RecordStore;
use crate::report::{build_report, render_text};
use anyhow::{anyhow, Result};

pub fn run_report(args: &ReportArgs) -> Result<()> {
    let path = resolve_results_path(&args.config, args.results.as_deref())?;
    if !path.is_file() {
        return Err(anyhow!(
            "no results at {} (run `rectify run` first)",
            path.display()
        ));
    }
    let store = RecordStore::load(&path)?;
    if store.is_empty() {
        tracing::warn!(path = %store.path().display(), "results table has no rows");
    }
    let report = build_report(&store);
    if args.json {
        print_json(&report, "report")
    } else {
        print!("{}", render_text(&report));
        Ok(())
    }
}
