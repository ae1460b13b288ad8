//! CSV persistence for the results table.
//!
//! Writes go to a temporary file next to the destination and are renamed
//! into place, so a reader only ever sees a complete table.
use super::schema::{IdentityKey, ImprovementCategory, Score, WorkItem, COLUMNS};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Filename")]
    filename: String,
    #[serde(rename = "Diff")]
    diff: String,
    #[serde(rename = "Baseline_Message", default)]
    baseline_message: Option<String>,
    #[serde(rename = "Rectified_Message", default)]
    rectified_message: Option<String>,
    #[serde(rename = "Developer_Score", default, deserialize_with = "lenient_score")]
    developer_score: Option<u8>,
    #[serde(rename = "Developer_Justification", default)]
    developer_justification: Option<String>,
    #[serde(rename = "Baseline_LLM_Score", default, deserialize_with = "lenient_score")]
    baseline_score: Option<u8>,
    #[serde(rename = "Baseline_LLM_Justification", default)]
    baseline_justification: Option<String>,
    #[serde(rename = "Rectifier_Score", default, deserialize_with = "lenient_score")]
    rectifier_score: Option<u8>,
    #[serde(rename = "Rectifier_Justification", default)]
    rectifier_justification: Option<String>,
    #[serde(rename = "Improvement_Category", default)]
    improvement_category: Option<String>,
    #[serde(rename = "Improvement_Reason", default)]
    improvement_reason: Option<String>,
}

impl From<&WorkItem> for CsvRow {
    fn from(item: &WorkItem) -> Self {
        Self {
            hash: item.key.commit_hash.clone(),
            message: item.key.message.clone(),
            filename: item.key.file_path.clone(),
            diff: item.key.diff.clone(),
            baseline_message: item.baseline_message.clone(),
            rectified_message: item.rectified_message.clone(),
            developer_score: item.developer_score.map(Score::value),
            developer_justification: item.developer_justification.clone(),
            baseline_score: item.baseline_score.map(Score::value),
            baseline_justification: item.baseline_justification.clone(),
            rectifier_score: item.rectifier_score.map(Score::value),
            rectifier_justification: item.rectifier_justification.clone(),
            improvement_category: item
                .improvement_category
                .map(|category| category.as_str().to_string()),
            improvement_reason: item.improvement_reason.clone(),
        }
    }
}

impl From<CsvRow> for WorkItem {
    fn from(row: CsvRow) -> Self {
        let score = |raw: Option<u8>| raw.map(|value| Score::from_raw(i64::from(value)));
        Self {
            key: IdentityKey {
                commit_hash: row.hash,
                message: row.message,
                file_path: row.filename,
                diff: row.diff,
            },
            baseline_message: row.baseline_message,
            rectified_message: row.rectified_message,
            developer_score: score(row.developer_score),
            developer_justification: row.developer_justification,
            baseline_score: score(row.baseline_score),
            baseline_justification: row.baseline_justification,
            rectifier_score: score(row.rectifier_score),
            rectifier_justification: row.rectifier_justification,
            improvement_category: row
                .improvement_category
                .filter(|label| !label.trim().is_empty())
                .map(|label| ImprovementCategory::from_label(&label)),
            improvement_reason: row.improvement_reason,
        }
    }
}

/// Read a persisted table; any malformed row fails the whole read.
pub fn read_table(path: &Path) -> Result<Vec<WorkItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    for required in &COLUMNS[..4] {
        if !headers.iter().any(|header| header == *required) {
            return Err(anyhow!(
                "{} is missing identity column {required}",
                path.display()
            ));
        }
    }
    let mut items = Vec::new();
    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.with_context(|| format!("parse row {} of {}", index + 1, path.display()))?;
        items.push(WorkItem::from(row));
    }
    Ok(items)
}

/// Write the full table with a header row, replacing `path` atomically.
pub fn write_table(path: &Path, items: &[WorkItem]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer
            .write_record(COLUMNS)
            .context("write results header")?;
        for item in items {
            writer
                .serialize(CsvRow::from(item))
                .with_context(|| format!("serialize row {}", item.key.commit_hash))?;
        }
        writer.flush().context("flush results table")?;
    }
    tmp.as_file_mut()
        .flush()
        .context("flush results temp file")?;
    tmp.as_file()
        .sync_all()
        .context("sync results temp file")?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}

/// Accepts `4`, `4.0`, blanks and `nan`. Numbers outside 0..=5 read back as
/// unscored; only non-numeric text is an error.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid score {trimmed:?}")))?;
    // Float-to-int casts saturate, so huge or infinite values stay out of range.
    Ok(Some(Score::from_raw(value.trunc() as i64).value()))
}
