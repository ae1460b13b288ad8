//! Typed schema for the results table.
//!
//! Every derived column is declared once here with its kind, so a fresh run
//! and a resumed run always produce the same column set and a field can only
//! ever hold a value of its declared type.
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;

/// Header row of the persisted table, identity columns first.
pub const COLUMNS: [&str; 14] = [
    "Hash",
    "Message",
    "Filename",
    "Diff",
    "Baseline_Message",
    "Rectified_Message",
    "Developer_Score",
    "Developer_Justification",
    "Baseline_LLM_Score",
    "Baseline_LLM_Justification",
    "Rectifier_Score",
    "Rectifier_Justification",
    "Improvement_Category",
    "Improvement_Reason",
];

/// Immutable identity of a work item across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub commit_hash: String,
    pub message: String,
    pub file_path: String,
    pub diff: String,
}

/// A freshly mined row: identity only, nothing derived yet.
pub type MinedRow = IdentityKey;

/// Quality score on the 1–5 scale, with 0 reserved for "no valid score".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const UNSCORED: Score = Score(0);
    pub const MAX: u8 = 5;

    /// Accept a raw model value; anything outside 0..=5 is unscored.
    pub fn from_raw(raw: i64) -> Score {
        match u8::try_from(raw) {
            Ok(value) if value <= Self::MAX => Score(value),
            _ => Score::UNSCORED,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// True for a real 1–5 rating, false for the unscored sentinel.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of improvement labels produced by the classify phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementCategory {
    Clarity,
    Specificity,
    Completeness,
    Conciseness,
    Convention,
    Accuracy,
    NoImprovement,
    Unclassified,
}

impl ImprovementCategory {
    /// Labels offered to the model; `Unclassified` is never offered.
    pub const OFFERED: [ImprovementCategory; 7] = [
        ImprovementCategory::Clarity,
        ImprovementCategory::Specificity,
        ImprovementCategory::Completeness,
        ImprovementCategory::Conciseness,
        ImprovementCategory::Convention,
        ImprovementCategory::Accuracy,
        ImprovementCategory::NoImprovement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImprovementCategory::Clarity => "clarity",
            ImprovementCategory::Specificity => "specificity",
            ImprovementCategory::Completeness => "completeness",
            ImprovementCategory::Conciseness => "conciseness",
            ImprovementCategory::Convention => "convention",
            ImprovementCategory::Accuracy => "accuracy",
            ImprovementCategory::NoImprovement => "no_improvement",
            ImprovementCategory::Unclassified => "unclassified",
        }
    }

    /// Map free-form label text onto the closed set.
    ///
    /// Case, surrounding whitespace, and `-`/space separators are ignored;
    /// anything unrecognized becomes `Unclassified`.
    pub fn from_label(label: &str) -> ImprovementCategory {
        let normalized = label
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        match normalized.as_str() {
            "clarity" => ImprovementCategory::Clarity,
            "specificity" => ImprovementCategory::Specificity,
            "completeness" => ImprovementCategory::Completeness,
            "conciseness" => ImprovementCategory::Conciseness,
            "convention" | "conventions" | "format" | "formatting" => {
                ImprovementCategory::Convention
            }
            "accuracy" | "technical_accuracy" => ImprovementCategory::Accuracy,
            "no_improvement" | "none" => ImprovementCategory::NoImprovement,
            _ => ImprovementCategory::Unclassified,
        }
    }
}

impl fmt::Display for ImprovementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub key: IdentityKey,
    pub baseline_message: Option<String>,
    pub rectified_message: Option<String>,
    pub developer_score: Option<Score>,
    pub developer_justification: Option<String>,
    pub baseline_score: Option<Score>,
    pub baseline_justification: Option<String>,
    pub rectifier_score: Option<Score>,
    pub rectifier_justification: Option<String>,
    pub improvement_category: Option<ImprovementCategory>,
    pub improvement_reason: Option<String>,
}

impl WorkItem {
    /// A newly mined item with every derived field absent.
    pub fn fresh(key: IdentityKey) -> Self {
        Self {
            key,
            baseline_message: None,
            rectified_message: None,
            developer_score: None,
            developer_justification: None,
            baseline_score: None,
            baseline_justification: None,
            rectifier_score: None,
            rectifier_justification: None,
            improvement_category: None,
            improvement_reason: None,
        }
    }

    /// Copy every derived field from `other`, keeping this item's identity.
    pub fn with_derived_from(key: IdentityKey, other: &WorkItem) -> Self {
        Self {
            key,
            ..other.clone()
        }
    }

    /// Whether the given derived field is still unset.
    pub fn is_missing(&self, field: Field) -> bool {
        match field {
            Field::BaselineMessage => self.baseline_message.is_none(),
            Field::RectifiedMessage => self.rectified_message.is_none(),
            Field::DeveloperScore => self.developer_score.is_none(),
            Field::DeveloperJustification => self.developer_justification.is_none(),
            Field::BaselineScore => self.baseline_score.is_none(),
            Field::BaselineJustification => self.baseline_justification.is_none(),
            Field::RectifierScore => self.rectifier_score.is_none(),
            Field::RectifierJustification => self.rectifier_justification.is_none(),
            Field::ImprovementCategory => self.improvement_category.is_none(),
            Field::ImprovementReason => self.improvement_reason.is_none(),
        }
    }

    /// Set one derived field, rejecting values of the wrong kind.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<()> {
        match (field, value) {
            (Field::BaselineMessage, FieldValue::Text(text)) => self.baseline_message = Some(text),
            (Field::RectifiedMessage, FieldValue::Text(text)) => {
                self.rectified_message = Some(text)
            }
            (Field::DeveloperScore, FieldValue::Score(score)) => {
                self.developer_score = Some(score)
            }
            (Field::DeveloperJustification, FieldValue::Text(text)) => {
                self.developer_justification = Some(text)
            }
            (Field::BaselineScore, FieldValue::Score(score)) => self.baseline_score = Some(score),
            (Field::BaselineJustification, FieldValue::Text(text)) => {
                self.baseline_justification = Some(text)
            }
            (Field::RectifierScore, FieldValue::Score(score)) => {
                self.rectifier_score = Some(score)
            }
            (Field::RectifierJustification, FieldValue::Text(text)) => {
                self.rectifier_justification = Some(text)
            }
            (Field::ImprovementCategory, FieldValue::Category(category)) => {
                self.improvement_category = Some(category)
            }
            (Field::ImprovementReason, FieldValue::Text(text)) => {
                self.improvement_reason = Some(text)
            }
            (field, value) => {
                return Err(anyhow!(
                    "field {field} expects a {} value, got {}",
                    field.kind(),
                    value.kind_label()
                ))
            }
        }
        Ok(())
    }
}

/// Storage kind of a derived column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    NullableNumeric,
    NullableText,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::NullableNumeric => f.write_str("numeric"),
            ColumnKind::NullableText => f.write_str("text"),
        }
    }
}

/// Derived columns of the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    BaselineMessage,
    RectifiedMessage,
    DeveloperScore,
    DeveloperJustification,
    BaselineScore,
    BaselineJustification,
    RectifierScore,
    RectifierJustification,
    ImprovementCategory,
    ImprovementReason,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::BaselineMessage,
        Field::RectifiedMessage,
        Field::DeveloperScore,
        Field::DeveloperJustification,
        Field::BaselineScore,
        Field::BaselineJustification,
        Field::RectifierScore,
        Field::RectifierJustification,
        Field::ImprovementCategory,
        Field::ImprovementReason,
    ];

    /// Column header used in the persisted table.
    pub fn column(&self) -> &'static str {
        match self {
            Field::BaselineMessage => "Baseline_Message",
            Field::RectifiedMessage => "Rectified_Message",
            Field::DeveloperScore => "Developer_Score",
            Field::DeveloperJustification => "Developer_Justification",
            Field::BaselineScore => "Baseline_LLM_Score",
            Field::BaselineJustification => "Baseline_LLM_Justification",
            Field::RectifierScore => "Rectifier_Score",
            Field::RectifierJustification => "Rectifier_Justification",
            Field::ImprovementCategory => "Improvement_Category",
            Field::ImprovementReason => "Improvement_Reason",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Field::DeveloperScore | Field::BaselineScore | Field::RectifierScore => {
                ColumnKind::NullableNumeric
            }
            _ => ColumnKind::NullableText,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A validated value for one derived field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Score(Score),
    Text(String),
    Category(ImprovementCategory),
}

impl FieldValue {
    fn kind_label(&self) -> &'static str {
        match self {
            FieldValue::Score(_) => "numeric",
            FieldValue::Text(_) => "text",
            FieldValue::Category(_) => "category",
        }
    }
}

/// Partial update for a single row; fields not listed are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowUpdate {
    values: Vec<(Field, FieldValue)>,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: Field, value: FieldValue) -> Self {
        self.values.push((field, value));
        self
    }

    /// Apply onto a copy first so a rejected value leaves the row unchanged.
    pub fn apply_to(self, item: &mut WorkItem) -> Result<()> {
        let mut updated = item.clone();
        for (field, value) in self.values {
            updated.set(field, value)?;
        }
        *item = updated;
        Ok(())
    }
}
