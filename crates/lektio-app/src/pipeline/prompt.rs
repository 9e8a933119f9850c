//! Prompt construction for the structured extraction stage.
//!
//! These helpers stay pure and generate the textual instructions and schema
//! payload sent to the model's structured-output endpoint.

use serde_json::Value as JsonValue;
use strum::IntoEnumIterator;

use super::record::{Priority, RecordDraft, SubmissionType};

/// Complete prompt package for a single document.
#[derive(Debug, Clone)]
pub struct ExtractionPrompt {
    pub system_message: String,
    pub user_message: String,
    pub schema: JsonValue,
}

/// Build the prompt for the provided document text. Known subject names are
/// offered as a hint so the model prefers catalog spellings over free text.
pub fn build_prompt(document_text: &str, known_subjects: &[String]) -> ExtractionPrompt {
    let schema = RecordDraft::schema();
    let schema_pretty =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());

    let system_message = "You are a precise assistant that reads course documents and extracts \
        assignment details. Respond with a single JSON object matching the provided schema. \
        No prose, no markdown fencing, no commentary."
        .to_string();

    let guidelines = build_guidelines(known_subjects);

    let user_message = format!(
        "Extract the assignment or exam details from the document below and return JSON \
        matching the schema exactly. Use null for anything the document does not state.\n\n\
        Guidelines:\n{guidelines}\nJSON schema:\n{schema_pretty}\n\nDocument text:\n```text\n{document_text}\n```"
    );

    ExtractionPrompt {
        system_message,
        user_message,
        schema,
    }
}

fn build_guidelines(known_subjects: &[String]) -> String {
    let mut items: Vec<String> = Vec::new();
    items.push("- `deadline` must be an ISO 8601 date (YYYY-MM-DD).".to_string());
    items.push(format!(
        "- `priority` must be one of: {}.",
        enum_list(priority_labels())
    ));
    items.push(format!(
        "- `submission_type` must be one of: {}.",
        enum_list(submission_labels())
    ));
    if known_subjects.is_empty() {
        items.push(
            "- `subject` is the course or subject name exactly as the document states it."
                .to_string(),
        );
    } else {
        items.push(format!(
            "- `subject` is the course or subject name; prefer one of the user's known \
            subjects when the document matches it: {}.",
            known_subjects.join(", ")
        ));
    }
    items.push(
        "- `requirements` is an array of short strings, one per deliverable; use an empty \
        array when none are listed."
            .to_string(),
    );
    items.push("- `points` is the total marks as an integer, or null.".to_string());
    items.push(
        "- `confidence` is your own estimate between 0 and 1 of how complete and accurate \
        the extraction is."
            .to_string(),
    );

    items
        .into_iter()
        .map(|line| format!("  * {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn enum_list(values: Vec<String>) -> String {
    values.join(", ")
}

fn priority_labels() -> Vec<String> {
    Priority::iter()
        .map(|variant| variant.as_ref().to_string())
        .collect()
}

fn submission_labels() -> Vec<String> {
    SubmissionType::iter()
        .map(|variant| variant.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_schema_and_guidelines() {
        let sample = "Assignment: Lab Report\nDue: 2025-04-01";
        let prompt = build_prompt(sample, &[]);
        assert!(prompt.user_message.contains("submission_type"));
        assert!(prompt.user_message.contains("\"deadline\""));
        assert!(prompt.user_message.contains("medium"));
        assert!(prompt.user_message.contains(sample));
        assert!(prompt.schema.is_object());
    }

    #[test]
    fn known_subjects_are_offered_as_a_hint() {
        let subjects = vec!["Mathematics".to_string(), "Physics".to_string()];
        let prompt = build_prompt("anything", &subjects);
        assert!(prompt.user_message.contains("Mathematics, Physics"));
    }

    #[test]
    fn system_message_forbids_fencing() {
        let prompt = build_prompt("anything", &[]);
        assert!(prompt.system_message.contains("No prose"));
    }
}
