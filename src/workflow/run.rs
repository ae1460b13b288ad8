//! Workflow run step: mine, fill baselines, analyze, checkpoint.
//!
//! Re-running the same command after a failure resumes from the results table.
use super::print_json;
use crate::cli::RunArgs;
use crate::config::{
    apply_env_overrides, default_config, load_config, validate_for_run, PipelineConfig,
};
use crate::lm::{analysis_model, baseline_generator};
use crate::miner::GitMiner;
use crate::pipeline::{Pipeline, RunSummary};
use crate::record::RecordStore;
use crate::report::{build_report, render_text};
use anyhow::{Context, Result};

pub fn run_run(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    tracing::info!(
        repo = %config.io.repo,
        output = %config.io.output_csv_path.display(),
        limit = ?config.io.processing_limit,
        "starting pipeline"
    );

    let miner = GitMiner::new(&config.io)?;
    let baseline = baseline_generator(&config.baseline_model).context("set up baseline model")?;
    let analysis = analysis_model(&config.analysis_model).context("set up analysis model")?;
    let summary = Pipeline::new(&config, miner, baseline, analysis).run()?;

    if args.json {
        print_json(&summary, "run summary")?;
    } else {
        print_summary(&summary, &config);
    }
    if args.report {
        let store = RecordStore::load(&config.io.output_csv_path)?;
        print!("{}", render_text(&build_report(&store)));
    }
    Ok(())
}

/// Config file (or defaults when absent), then CLI flags, then environment.
fn resolve_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = if args.config.is_file() {
        load_config(&args.config)?
    } else {
        tracing::info!(path = %args.config.display(), "no config file; using defaults");
        default_config()
    };
    if let Some(repo) = &args.repo {
        config.io.repo = repo.clone();
    }
    if let Some(limit) = args.limit {
        config.io.processing_limit = Some(limit);
    }
    if let Some(output) = &args.output {
        config.io.output_csv_path = output.clone();
    }
    apply_env_overrides(&mut config);
    validate_for_run(&config)?;
    Ok(config)
}

fn print_summary(summary: &RunSummary, config: &PipelineConfig) {
    println!(
        "{} rows in {} ({}; {} mined this run)",
        summary.total_rows,
        config.io.output_csv_path.display(),
        if summary.resumed { "resumed" } else { "fresh start" },
        summary.mined
    );
    println!("baselines generated: {}", summary.baselines_generated);
    if summary.baseline_fallbacks > 0 {
        println!(
            "baseline fallbacks: {} (generator returned a blank message)",
            summary.baseline_fallbacks
        );
    }
    println!("rows analyzed: {}", summary.rows_enriched);
    if summary.rectify_fallbacks > 0 {
        println!(
            "rectify fallbacks: {} (model output had no usable message)",
            summary.rectify_fallbacks
        );
    }
}
