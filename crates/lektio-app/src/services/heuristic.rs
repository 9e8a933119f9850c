//! Deterministic fallback extractor.
//!
//! Used whenever the model path is unavailable or fails. Works line by line
//! over the raw document text with fixed patterns. Never as confident as a
//! successful model parse, but never zero either: every record it produces
//! carries a fixed 0.7 confidence.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::record::{
    DEFAULT_TITLE, ExtractedRecord, ExtractionMethod, Priority, SubmissionType,
};
use crate::services::reconcile::normalize_deadline;

/// Confidence stamped on every heuristic record.
pub const HEURISTIC_CONFIDENCE: f32 = 0.7;

const MAX_REQUIREMENT_LINES: usize = 5;
const MAX_DESCRIPTION_LINES: usize = 3;

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:assignment|project|homework)\s*:\s*(.+)$").expect("title regex compiles")
});

static SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:subject|course|class)\s*:\s*(.+)$").expect("subject regex compiles")
});

static DATE_SHAPED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("date regex compiles")
});

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("integer regex compiles"));

static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-•]|\d+[.)])\s*(.+)$").expect("bullet regex compiles")
});

/// Extracts a record from raw text using the deterministic rules, with the
/// local calendar date as the reference point for priority.
pub fn extract(text: &str) -> ExtractedRecord {
    extract_at(text, Local::now().date_naive())
}

/// Same as [`extract`] but with an explicit "today" so the deadline-derived
/// priority is reproducible.
pub fn extract_at(text: &str, today: NaiveDate) -> ExtractedRecord {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let title = find_title(&lines);
    let deadline = find_deadline(&lines);
    let subject = find_subject(&lines);
    let points = find_points(&lines);
    let requirements = find_requirements(&lines);
    let submission_type = infer_submission_type(title.as_deref().unwrap_or_default());
    let priority = match deadline.as_deref().and_then(normalize_deadline) {
        Some(iso) => priority_from_deadline(&iso, today),
        None => Priority::Medium,
    };
    let description = build_description(&lines);

    ExtractedRecord {
        title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description,
        deadline,
        subject,
        priority,
        submission_type,
        instructions: None,
        requirements,
        points,
        confidence: HEURISTIC_CONFIDENCE,
        extraction_method: ExtractionMethod::Heuristic,
        missing_fields: Vec::new(),
    }
}

/// Days-until-deadline buckets: three days or fewer is urgent, a week out is
/// routine, anything later can wait.
pub fn priority_from_deadline(deadline_iso: &str, today: NaiveDate) -> Priority {
    let Ok(deadline) = NaiveDate::parse_from_str(deadline_iso, "%Y-%m-%d") else {
        return Priority::Medium;
    };
    let days = deadline.signed_duration_since(today).num_days();
    if days <= 3 {
        Priority::High
    } else if days <= 7 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn find_title(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        TITLE_RE
            .captures(line)
            .map(|captures| captures[1].trim().to_string())
            .filter(|title| !title.is_empty())
    })
}

fn find_deadline(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if !(lower.contains("due") || lower.contains("deadline") || lower.contains("date")) {
            return None;
        }
        DATE_SHAPED_RE
            .find(line)
            .map(|matched| matched.as_str().to_string())
    })
}

fn find_subject(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        SUBJECT_RE
            .captures(line)
            .map(|captures| captures[1].trim().to_string())
            .filter(|subject| !subject.is_empty())
    })
}

fn find_points(lines: &[&str]) -> Option<u32> {
    lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if !(lower.contains("points") || lower.contains("marks") || lower.contains("grade")) {
            return None;
        }
        INTEGER_RE
            .find(line)
            .and_then(|matched| matched.as_str().parse().ok())
    })
}

fn find_requirements(lines: &[&str]) -> Vec<String> {
    let Some(header_index) = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        lower.contains("requirements") || lower.contains("instructions")
    }) else {
        return Vec::new();
    };

    lines
        .iter()
        .skip(header_index + 1)
        .map_while(|line| {
            BULLET_RE
                .captures(line)
                .map(|captures| captures[1].trim().to_string())
        })
        .take(MAX_REQUIREMENT_LINES)
        .collect()
}

fn infer_submission_type(title: &str) -> SubmissionType {
    let lower = title.to_lowercase();
    if lower.contains("project") {
        SubmissionType::Project
    } else if lower.contains("exam") || lower.contains("test") {
        SubmissionType::Exam
    } else if lower.contains("tutorial") {
        SubmissionType::Tutorial
    } else {
        SubmissionType::Assignment
    }
}

fn build_description(lines: &[&str]) -> String {
    lines
        .iter()
        .filter(|line| !line.is_empty())
        .filter(|line| !TITLE_RE.is_match(line))
        .filter(|line| {
            let lower = line.to_lowercase();
            let mentions_due =
                lower.contains("due") || lower.contains("deadline") || lower.contains("date");
            !(mentions_due && DATE_SHAPED_RE.is_match(line))
        })
        .take(MAX_DESCRIPTION_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
    }

    const SAMPLE: &str = "Assignment: Lab Report\n\
        Due: 21/3/2025\n\
        Subject: Physics\n\
        Worth 20 points in total.\n\
        Requirements:\n\
        - Abstract\n\
        - Data tables\n\
        1. Error analysis\n\
        Submit as a single PDF.";

    #[test]
    fn extracts_all_labelled_fields() {
        let record = extract_at(SAMPLE, today());
        assert_eq!(record.title, "Lab Report");
        assert_eq!(record.deadline.as_deref(), Some("21/3/2025"));
        assert_eq!(record.subject.as_deref(), Some("Physics"));
        assert_eq!(record.points, Some(20));
        assert_eq!(
            record.requirements,
            vec!["Abstract", "Data tables", "Error analysis"]
        );
        assert_eq!(record.confidence, HEURISTIC_CONFIDENCE);
        assert_eq!(record.extraction_method, ExtractionMethod::Heuristic);
    }

    #[test]
    fn priority_tracks_days_until_deadline() {
        // 2025-03-21 is eleven days past `today()`.
        let record = extract_at(SAMPLE, today());
        assert_eq!(record.priority, Priority::Low);

        let soon = extract_at(SAMPLE, NaiveDate::from_ymd_opt(2025, 3, 19).unwrap());
        assert_eq!(soon.priority, Priority::High);

        let week_out = extract_at(SAMPLE, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(week_out.priority, Priority::Medium);
    }

    #[test]
    fn no_deadline_defaults_to_medium_priority() {
        let record = extract_at("Assignment: Reading notes\nChapter 4 summary.", today());
        assert_eq!(record.deadline, None);
        assert_eq!(record.priority, Priority::Medium);
    }

    #[test]
    fn missing_title_gets_placeholder() {
        let record = extract_at("Just some text without labels.", today());
        assert_eq!(record.title, DEFAULT_TITLE);
    }

    #[test]
    fn submission_type_inferred_from_title() {
        let project = extract_at("Project: Bridge model", today());
        assert_eq!(project.submission_type, SubmissionType::Project);

        let exam = extract_at("Assignment: Practice test paper", today());
        assert_eq!(exam.submission_type, SubmissionType::Exam);

        let default = extract_at("Homework: Worksheet 3", today());
        assert_eq!(default.submission_type, SubmissionType::Assignment);
    }

    #[test]
    fn requirements_stop_at_first_non_bullet_line() {
        let text = "Instructions:\n- one\n- two\nnot a bullet\n- three";
        let record = extract_at(text, today());
        assert_eq!(record.requirements, vec!["one", "two"]);
    }

    #[test]
    fn requirements_cap_at_five_lines() {
        let text = "Requirements:\n- a\n- b\n- c\n- d\n- e\n- f\n- g";
        let record = extract_at(text, today());
        assert_eq!(record.requirements.len(), 5);
    }

    #[test]
    fn description_skips_title_and_due_lines() {
        let record = extract_at(SAMPLE, today());
        assert_eq!(
            record.description,
            "Subject: Physics Worth 20 points in total. Requirements:"
        );
    }

    #[test]
    fn iso_deadline_is_taken_verbatim() {
        let record = extract_at("Deadline: 2025-04-01", today());
        assert_eq!(record.deadline.as_deref(), Some("2025-04-01"));
    }
}
