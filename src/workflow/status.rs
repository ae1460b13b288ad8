//! Workflow status step.
//!
//! Counts the rows each stage still has to process, using the same absent-field
//! rules the pipeline resumes with.
use super::{print_json, resolve_results_path};
use crate::cli::StatusArgs;
use crate::pipeline::COMPLETION_FIELD;
use crate::record::{Field, RecordStore};
use crate::util::display_path;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub results_path: String,
    pub exists: bool,
    pub total_rows: usize,
    pub needing_baseline: usize,
    pub needing_analysis: usize,
    pub complete: usize,
    /// Rows lacking each derived column, keyed by column header.
    pub missing_by_column: BTreeMap<&'static str, usize>,
}

impl StatusSummary {
    fn next_action(&self) -> &'static str {
        if !self.exists || self.needing_baseline > 0 || self.needing_analysis > 0 {
            "rectify run"
        } else {
            "rectify report"
        }
    }
}

/// Summarize a results table; a missing table is an empty, not-yet-started one.
pub fn status_summary(path: &Path) -> Result<StatusSummary> {
    let cwd = std::env::current_dir().ok();
    let results_path = display_path(path, cwd.as_deref());
    if !path.is_file() {
        return Ok(StatusSummary {
            results_path,
            exists: false,
            total_rows: 0,
            needing_baseline: 0,
            needing_analysis: 0,
            complete: 0,
            missing_by_column: BTreeMap::new(),
        });
    }
    let store = RecordStore::load(path)?;
    let needing_analysis = store.rows_needing(COMPLETION_FIELD).count();
    let missing_by_column = Field::ALL
        .iter()
        .map(|&field| (field.column(), store.rows_needing(field).count()))
        .filter(|&(_, missing)| missing > 0)
        .collect();
    Ok(StatusSummary {
        results_path,
        exists: true,
        total_rows: store.len(),
        needing_baseline: store.rows_needing(Field::BaselineMessage).count(),
        needing_analysis,
        complete: store.len() - needing_analysis,
        missing_by_column,
    })
}

pub fn run_status(args: &StatusArgs) -> Result<()> {
    let path = resolve_results_path(&args.config, args.results.as_deref())?;
    let summary = status_summary(&path)?;
    if args.json {
        return print_json(&summary, "status summary");
    }
    if !summary.exists {
        println!("no results yet at {}", summary.results_path);
    } else {
        println!("results: {}", summary.results_path);
        println!("rows: {}", summary.total_rows);
        println!("  complete: {}", summary.complete);
        println!("  needing baseline: {}", summary.needing_baseline);
        println!("  needing analysis: {}", summary.needing_analysis);
        for (column, missing) in &summary.missing_by_column {
            println!("    {column}: {missing} missing");
        }
    }
    println!("next: {}", summary.next_action());
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
