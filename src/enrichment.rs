//! Per-row enrichment: rectify, evaluate three messages, classify.
//!
//! Every phase runs strictly in order and feeds the next. Malformed model
//! output never fails a row; it degrades to defaults (fallback message,
//! unscored, empty text, `unclassified`). Only a failing model call aborts.
use crate::config::InferenceConfig;
use crate::lm::prompts::{classify_prompt, evaluate_prompt, rectify_prompt};
use crate::lm::response::{extract_score, extract_text};
use crate::lm::AnalysisModel;
use crate::record::{Field, FieldValue, ImprovementCategory, RowUpdate, Score, WorkItem};
use crate::util::truncate_chars;
use anyhow::{Context, Result};

/// Score and justification for one evaluated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: Score,
    pub justification: String,
}

/// Everything computed for one row, applied to the table in one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub rectified_message: String,
    /// True when the rectify response was unusable and the fallback was stored.
    pub used_fallback: bool,
    pub developer: Evaluation,
    pub baseline: Evaluation,
    pub rectifier: Evaluation,
    pub improvement_category: ImprovementCategory,
    pub improvement_reason: String,
}

impl Enrichment {
    pub fn into_update(self) -> RowUpdate {
        RowUpdate::new()
            .set(
                Field::RectifiedMessage,
                FieldValue::Text(self.rectified_message),
            )
            .set(
                Field::DeveloperScore,
                FieldValue::Score(self.developer.score),
            )
            .set(
                Field::DeveloperJustification,
                FieldValue::Text(self.developer.justification),
            )
            .set(Field::BaselineScore, FieldValue::Score(self.baseline.score))
            .set(
                Field::BaselineJustification,
                FieldValue::Text(self.baseline.justification),
            )
            .set(
                Field::RectifierScore,
                FieldValue::Score(self.rectifier.score),
            )
            .set(
                Field::RectifierJustification,
                FieldValue::Text(self.rectifier.justification),
            )
            .set(
                Field::ImprovementCategory,
                FieldValue::Category(self.improvement_category),
            )
            .set(
                Field::ImprovementReason,
                FieldValue::Text(self.improvement_reason),
            )
    }
}

/// Drives the analysis model through the fixed per-row protocol.
pub struct RowEnricher<'a, M: AnalysisModel + ?Sized> {
    model: &'a mut M,
    max_input_chars: usize,
    fallback_message: &'a str,
}

impl<'a, M: AnalysisModel + ?Sized> RowEnricher<'a, M> {
    pub fn new(model: &'a mut M, inference: &'a InferenceConfig) -> Self {
        Self {
            model,
            max_input_chars: inference.max_input_chars,
            fallback_message: &inference.rectify_fallback_message,
        }
    }

    /// Run rectify → evaluate ×3 → classify for one row.
    ///
    /// Nothing is written to the table here; the caller applies the whole
    /// result at once, so an aborted row leaves no partial state behind.
    pub fn enrich(&mut self, item: &WorkItem) -> Result<Enrichment> {
        let diff = truncate_chars(&item.key.diff, self.max_input_chars);

        let response = self
            .model
            .complete(&rectify_prompt(diff))
            .context("rectify call")?;
        let parsed = extract_text(&response, "rectified_message");
        let parsed = parsed.trim();
        let used_fallback = parsed.is_empty();
        let rectified_message = if used_fallback {
            tracing::debug!(file = %item.key.file_path, "rectify response unusable; using fallback");
            self.fallback_message.to_string()
        } else {
            parsed.to_string()
        };

        let developer = self
            .evaluate(diff, &item.key.message)
            .context("evaluate developer message")?;
        let baseline = self
            .evaluate(diff, item.baseline_message.as_deref().unwrap_or_default())
            .context("evaluate baseline message")?;
        let rectifier = self
            .evaluate(diff, &rectified_message)
            .context("evaluate rectified message")?;

        let response = self
            .model
            .complete(&classify_prompt(&item.key.message, &rectified_message))
            .context("classify call")?;
        let improvement_category =
            ImprovementCategory::from_label(&extract_text(&response, "improvement_category"));
        let improvement_reason = extract_text(&response, "reason");

        Ok(Enrichment {
            rectified_message,
            used_fallback,
            developer,
            baseline,
            rectifier,
            improvement_category,
            improvement_reason,
        })
    }

    fn evaluate(&mut self, diff: &str, message: &str) -> Result<Evaluation> {
        let response = self.model.complete(&evaluate_prompt(diff, message))?;
        let raw = extract_score(&response, "score");
        let score = Score::from_raw(raw);
        if !score.is_valid() {
            tracing::debug!(raw, "evaluation produced no valid score");
        }
        Ok(Evaluation {
            score,
            justification: extract_text(&response, "justification"),
        })
    }
}

#[cfg(test)]
#[path = "enrichment_tests.rs"]
mod tests;
