//! Resumable pipeline: mine → reconcile + baseline fill → per-row enrichment.
//!
//! Progress is checkpointed to the results table after the baseline batch and
//! after every enriched row, so killing the process loses at most the row in
//! flight. Which rows still need work is decided purely by absent fields,
//! which makes re-running the same command the resume mechanism.
use crate::config::PipelineConfig;
use crate::enrichment::RowEnricher;
use crate::lm::{AnalysisModel, BaselineGenerator};
use crate::miner::CommitMiner;
use crate::record::{Field, FieldValue, IdentityKey, Origin, RecordStore, RowUpdate};
use crate::util::truncate_chars;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::time::Instant;

/// Field whose presence marks a row as fully enriched.
pub const COMPLETION_FIELD: Field = Field::RectifierScore;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mined: usize,
    pub total_rows: usize,
    pub resumed: bool,
    pub baselines_generated: usize,
    /// Blank baseline answers replaced by the configured fallback.
    pub baseline_fallbacks: usize,
    pub rows_enriched: usize,
    pub rectify_fallbacks: usize,
}

/// One pipeline run over its collaborators.
pub struct Pipeline<'a, Mi, B, A>
where
    Mi: CommitMiner,
    B: BaselineGenerator,
    A: AnalysisModel,
{
    config: &'a PipelineConfig,
    miner: Mi,
    baseline: B,
    analysis: A,
}

impl<'a, Mi, B, A> Pipeline<'a, Mi, B, A>
where
    Mi: CommitMiner,
    B: BaselineGenerator,
    A: AnalysisModel,
{
    pub fn new(config: &'a PipelineConfig, miner: Mi, baseline: B, analysis: A) -> Self {
        Self {
            config,
            miner,
            baseline,
            analysis,
        }
    }

    /// Run every stage once; an empty mining result is fatal.
    pub fn run(self) -> Result<RunSummary> {
        let Self {
            config,
            mut miner,
            baseline,
            mut analysis,
        } = self;

        let mined = miner.mine(config.io.processing_limit)?;
        if mined.is_empty() {
            return Err(anyhow!(
                "no bug-fixing commits found in {}; nothing to analyze",
                config.io.repo
            ));
        }
        let mined_count = mined.len();

        let mut store = RecordStore::reconcile(mined, &config.io.output_csv_path)?;
        let (baselines_generated, baseline_fallbacks) =
            fill_baselines(&mut store, baseline, config)?;
        let (rows_enriched, rectify_fallbacks) =
            enrich_pending(&mut store, &mut analysis, config)?;

        Ok(RunSummary {
            mined: mined_count,
            total_rows: store.len(),
            resumed: store.origin() == Origin::Resumed,
            baselines_generated,
            baseline_fallbacks,
            rows_enriched,
            rectify_fallbacks,
        })
    }
}

/// Generate missing baseline messages in batches, then checkpoint once.
///
/// Blank answers are stored as the configured fallback, since an empty cell
/// reads back as absent and would be regenerated on every run. Returns the
/// number of rows filled and how many of those took the fallback.
///
/// Takes the generator by value so it is released as soon as the stage ends.
fn fill_baselines<B: BaselineGenerator>(
    store: &mut RecordStore,
    mut generator: B,
    config: &PipelineConfig,
) -> Result<(usize, usize)> {
    let pending: Vec<(IdentityKey, String)> = store
        .rows_needing(Field::BaselineMessage)
        .map(|(key, item)| {
            let diff = truncate_chars(&item.key.diff, config.inference.max_input_chars);
            (key.clone(), diff.to_string())
        })
        .collect();
    if pending.is_empty() {
        tracing::info!("all baseline messages already generated");
        return Ok((0, 0));
    }

    let batch_size = config.inference.baseline_batch_size;
    let batches = pending.len().div_ceil(batch_size);
    tracing::info!(rows = pending.len(), batches, "generating baseline messages");
    let mut fallbacks = 0usize;
    for (number, batch) in pending.chunks(batch_size).enumerate() {
        let diffs: Vec<String> = batch.iter().map(|(_, diff)| diff.clone()).collect();
        let messages = generator
            .generate(&diffs)
            .with_context(|| format!("baseline batch {}/{}", number + 1, batches))?;
        if messages.len() != diffs.len() {
            return Err(anyhow!(
                "baseline generator returned {} messages for {} diffs",
                messages.len(),
                diffs.len()
            ));
        }
        for ((key, _), message) in batch.iter().zip(messages) {
            let message = if message.trim().is_empty() {
                tracing::warn!(
                    commit = %key.commit_hash,
                    file = %key.file_path,
                    "blank baseline message; using fallback"
                );
                fallbacks += 1;
                config.inference.baseline_fallback_message.clone()
            } else {
                message
            };
            store.update(
                key,
                RowUpdate::new().set(Field::BaselineMessage, FieldValue::Text(message)),
            )?;
        }
        tracing::debug!(batch = number + 1, batches, "baseline batch complete");
    }
    store.flush().context("checkpoint baseline messages")?;
    generator.release();
    tracing::info!(rows = pending.len(), fallbacks, "baseline generation complete");
    Ok((pending.len(), fallbacks))
}

/// Enrich every row lacking a final score, checkpointing after each one.
fn enrich_pending<A: AnalysisModel>(
    store: &mut RecordStore,
    analysis: &mut A,
    config: &PipelineConfig,
) -> Result<(usize, usize)> {
    let pending: Vec<IdentityKey> = store
        .rows_needing(COMPLETION_FIELD)
        .map(|(key, _)| key.clone())
        .collect();
    if pending.is_empty() {
        tracing::info!("all rows have already been analyzed");
        return Ok((0, 0));
    }

    let total = pending.len();
    tracing::info!(rows = total, "rows requiring advanced analysis");
    let mut enriched = 0usize;
    let mut fallbacks = 0usize;
    for (position, key) in pending.iter().enumerate() {
        if !store.needs(key, COMPLETION_FIELD) {
            continue;
        }
        let Some(item) = store.get(key).cloned() else {
            continue;
        };
        let start = Instant::now();
        let enrichment = RowEnricher::new(&mut *analysis, &config.inference)
            .enrich(&item)
            .with_context(|| {
                format!(
                    "analyze commit {} file {}",
                    item.key.commit_hash, item.key.file_path
                )
            })?;
        if enrichment.used_fallback {
            fallbacks += 1;
        }
        let score = enrichment.rectifier.score;
        store.update(key, enrichment.into_update())?;
        store
            .flush()
            .with_context(|| format!("checkpoint after row {}", position + 1))?;
        analysis.release();
        enriched += 1;
        tracing::info!(
            row = position + 1,
            total,
            elapsed_ms = start.elapsed().as_millis(),
            rectifier_score = score.value(),
            file = %item.key.file_path,
            "row analyzed"
        );
    }
    Ok((enriched, fallbacks))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
