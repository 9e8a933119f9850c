//! Structured representation of an assignment or exam extracted from an
//! uploaded document.
//!
//! These data types model the contract between the extraction stages and the
//! host application. They stay pure, provide JSON schema generation for
//! prompting, and expose validation so downstream code can refuse malformed
//! records before persisting or displaying them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::{AsRefStr, EnumIter, EnumString};
use thiserror::Error;

use crate::services::reconcile::normalize_deadline;
use crate::text::clean_field;

/// Title used when no title could be extracted from the document.
pub const DEFAULT_TITLE: &str = "Untitled assignment";

/// Confidence assigned when the model omits its own estimate.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Canonical record produced by the pipeline for a single upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub priority: Priority,
    pub submission_type: SubmissionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    pub confidence: f32,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<MissingField>,
}

/// Urgency bucket for the assignment.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Kind of work the document describes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionType {
    #[default]
    Assignment,
    Tutorial,
    Project,
    Exam,
}

/// Which extraction path produced the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExtractionMethod {
    Ai,
    Heuristic,
}

/// Required field the pipeline could not populate with a trusted value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingField {
    Subject,
    Deadline,
}

/// Loosely-typed payload the model is asked to return. Decoding is lenient:
/// missing keys default, `requirements` and `points` arrive as raw JSON so
/// malformed values degrade to safe defaults instead of failing the decode.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub subject: Option<String>,
    pub priority: Option<String>,
    #[serde(alias = "submissionType")]
    pub submission_type: Option<String>,
    pub instructions: Option<String>,
    #[schemars(with = "Option<Vec<String>>")]
    pub requirements: Option<JsonValue>,
    #[schemars(with = "Option<u32>")]
    pub points: Option<JsonValue>,
    pub confidence: Option<f64>,
}

impl RecordDraft {
    /// Generate a JSON schema describing the payload we expect the model to
    /// return.
    pub fn schema() -> JsonValue {
        let schema = schemars::schema_for!(RecordDraft);
        serde_json::to_value(&schema).expect("schema is serializable")
    }
}

impl ExtractedRecord {
    /// Builds a record from a model draft, independently validating and
    /// coercing every field. Nothing here raises: malformed values reset to
    /// safe defaults per field.
    pub fn from_draft(draft: RecordDraft) -> Self {
        let title = draft
            .title
            .as_deref()
            .and_then(clean_field)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let deadline = draft
            .deadline
            .as_deref()
            .and_then(clean_field)
            .and_then(|raw| normalize_deadline(&raw));

        let priority = draft
            .priority
            .as_deref()
            .map(str::trim)
            .and_then(|raw| raw.parse::<Priority>().ok())
            .unwrap_or_default();

        let submission_type = draft
            .submission_type
            .as_deref()
            .map(str::trim)
            .and_then(|raw| raw.parse::<SubmissionType>().ok())
            .unwrap_or_default();

        let confidence = draft
            .confidence
            .map(|value| value as f32)
            .unwrap_or(DEFAULT_CONFIDENCE)
            .clamp(0.0, 1.0);

        Self {
            title,
            description: draft
                .description
                .as_deref()
                .and_then(clean_field)
                .unwrap_or_default(),
            deadline,
            subject: draft.subject.as_deref().and_then(clean_field),
            priority,
            submission_type,
            instructions: draft.instructions.as_deref().and_then(clean_field),
            requirements: coerce_requirements(draft.requirements.as_ref()),
            points: coerce_points(draft.points.as_ref()),
            confidence,
            extraction_method: ExtractionMethod::Ai,
            missing_fields: Vec::new(),
        }
    }

    /// Validate semantic invariants the pipeline promises its callers.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        let mut issues = Vec::new();

        if self.title.trim().is_empty() {
            issues.push("title must not be empty".to_string());
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            issues.push(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            ));
        }

        if let Some(deadline) = &self.deadline {
            if chrono::NaiveDate::parse_from_str(deadline, "%Y-%m-%d").is_err() {
                issues.push(format!(
                    "deadline must be ISO 8601 (YYYY-MM-DD), got '{deadline}'"
                ));
            }
            if self.missing_fields.contains(&MissingField::Deadline) {
                issues.push("deadline is populated but flagged missing".to_string());
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(RecordValidationError { issues })
        }
    }
}

/// Validation failures aggregated into a single error.
#[derive(Debug, Error)]
#[error("extracted record validation failed: {issues:?}")]
pub struct RecordValidationError {
    pub issues: Vec<String>,
}

/// A requirements value is accepted only as a list of non-empty strings;
/// non-list or mixed input becomes an empty list.
fn coerce_requirements(value: Option<&JsonValue>) -> Vec<String> {
    let Some(JsonValue::Array(items)) = value else {
        return Vec::new();
    };

    let mut requirements = Vec::with_capacity(items.len());
    for item in items {
        let Some(text) = item.as_str() else {
            return Vec::new();
        };
        if let Some(cleaned) = clean_field(text) {
            requirements.push(cleaned);
        }
    }
    requirements
}

/// Points coerce to an integer by stripping non-digit characters; anything
/// unparseable maps to `None`.
fn coerce_points(value: Option<&JsonValue>) -> Option<u32> {
    match value? {
        JsonValue::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|f| f.max(0.0) as u64))
            .and_then(|n| u32::try_from(n).ok()),
        JsonValue::String(raw) => {
            let digits = raw
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>();
            digits.parse().ok()
        }
        _ => None,
    }
}
