//! Summary statistics over a results table.
//!
//! Averages and distributions only count valid (1–5) scores; the hit rate is
//! the share of all rows that received one.
use crate::record::{Field, ImprovementCategory, RecordStore, Score, WorkItem};
use serde::Serialize;
use std::collections::BTreeMap;

const RULE: &str = "==================================================";

/// Score columns in report order, with their display names.
const SCORED: [(&str, Field); 3] = [
    ("Developer", Field::DeveloperScore),
    ("Baseline LLM", Field::BaselineScore),
    ("Rectifier", Field::RectifierScore),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub name: &'static str,
    pub column: &'static str,
    pub valid: usize,
    /// Mean of valid scores; absent when there are none.
    pub average: Option<f64>,
    /// Percentage of all rows holding a valid score.
    pub hit_rate: f64,
    pub distribution: BTreeMap<u8, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_rows: usize,
    pub scores: Vec<ScoreSummary>,
    pub categories: BTreeMap<ImprovementCategory, usize>,
}

fn score_of(item: &WorkItem, field: Field) -> Option<Score> {
    match field {
        Field::DeveloperScore => item.developer_score,
        Field::BaselineScore => item.baseline_score,
        Field::RectifierScore => item.rectifier_score,
        _ => None,
    }
}

pub fn build_report(store: &RecordStore) -> ReportSummary {
    let items = store.items();
    let total_rows = items.len();
    let scores = SCORED
        .iter()
        .map(|&(name, field)| {
            let mut distribution = BTreeMap::new();
            let mut sum = 0u64;
            let mut valid = 0usize;
            for score in items
                .iter()
                .filter_map(|item| score_of(item, field))
                .filter(|score| score.is_valid())
            {
                *distribution.entry(score.value()).or_insert(0) += 1;
                sum += u64::from(score.value());
                valid += 1;
            }
            let average = (valid > 0).then(|| sum as f64 / valid as f64);
            let hit_rate = if total_rows == 0 {
                0.0
            } else {
                valid as f64 * 100.0 / total_rows as f64
            };
            ScoreSummary {
                name,
                column: field.column(),
                valid,
                average,
                hit_rate,
                distribution,
            }
        })
        .collect();

    let mut categories = BTreeMap::new();
    for category in items.iter().filter_map(|item| item.improvement_category) {
        *categories.entry(category).or_insert(0) += 1;
    }

    ReportSummary {
        total_rows,
        scores,
        categories,
    }
}

/// Console rendering: one block per score column, then the category counts
/// ordered by frequency.
pub fn render_text(report: &ReportSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{RULE}\n DETAILED SCORE ANALYSIS ({} rows)\n{RULE}\n",
        report.total_rows
    ));
    for score in &report.scores {
        out.push_str(&format!("\n--- {} ---\n", score.name));
        let Some(average) = score.average else {
            out.push_str("No valid scores found.\n");
            continue;
        };
        out.push_str(&format!("Average Score: {average:.2} / {}\n", Score::MAX));
        out.push_str(&format!("Hit Rate (valid scores > 0): {:.1}%\n", score.hit_rate));
        out.push_str("Score Distribution:\n");
        for (value, count) in &score.distribution {
            out.push_str(&format!("  {value}: {count}\n"));
        }
    }

    out.push_str(&format!("\n{RULE}\n RECTIFICATION IMPROVEMENT ANALYSIS\n{RULE}\n"));
    if report.categories.is_empty() {
        out.push_str("No improvement categories recorded.\n");
    } else {
        out.push_str("Improvement Category Distribution:\n");
        let mut ranked: Vec<_> = report.categories.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let width = ranked
            .iter()
            .map(|(category, _)| category.as_str().len())
            .max()
            .unwrap_or(0);
        for (category, count) in ranked {
            out.push_str(&format!("  {:<width$}  {count}\n", category.as_str()));
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}
