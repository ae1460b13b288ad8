//! Command handlers behind the CLI.
//!
//! Each handler loads what it needs from the config file, does one thing, and
//! prints either human-readable text or JSON to stdout.
mod init;
mod report;
mod run;
mod status;

use crate::config::{load_config, PipelineConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use init::run_init;
pub use report::run_report;
pub use run::run_run;
pub use status::run_status;

/// Results table for read-only commands: an explicit path wins, otherwise the
/// one named by the config.
fn resolve_results_path(config_path: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let config: PipelineConfig = load_config(config_path).with_context(|| {
        format!(
            "locate results via {} (pass --results to skip the config)",
            config_path.display()
        )
    })?;
    Ok(config.io.output_csv_path)
}

fn print_json<T: serde::Serialize>(value: &T, what: &str) -> Result<()> {
    let text = serde_json::to_string_pretty(value).with_context(|| format!("serialize {what}"))?;
    println!("{text}");
    Ok(())
}
