//! Final reconciliation of a draft record: deadline normalization, missing
//! field computation, and the merge step for human-supplied values.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::record::{ExtractedRecord, MissingField};
use crate::services::subjects::{self, SubjectCatalogEntry};
use crate::text::clean_field;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso date regex compiles"));

static DMY_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2}|\d{4})$").expect("dmy date regex compiles")
});

/// Formats tried when the input is neither ISO nor day-first numeric.
const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y/%m/%d",
];

/// Normalizes a free-form deadline into canonical ISO `YYYY-MM-DD`.
///
/// Accepts ISO dates as-is (when calendar-valid), `D/M/YYYY` and `D-M-YYYY`
/// with two- or four-digit years (two-digit years are assumed 2000s), then a
/// fixed list of generic formats. Anything else yields `None` — the pipeline
/// would rather flag the deadline as missing than propagate an ambiguous
/// string.
pub fn normalize_deadline(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if ISO_DATE_RE.is_match(value) {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|_| value.to_string());
    }

    if let Some(captures) = DMY_DATE_RE.captures(value) {
        let day: u32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        let mut year: i32 = captures[3].parse().ok()?;
        if year < 100 {
            year += 2000;
        }

        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive().format("%Y-%m-%d").to_string());
    }

    for format in GENERIC_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    None
}

/// Reconciles a draft record in place: normalizes the deadline (or converts
/// it to missing), flags an unknown subject, and re-clamps confidence.
///
/// Running this on an already-resolved record is a no-op.
pub fn reconcile(record: &mut ExtractedRecord, catalog: &[SubjectCatalogEntry]) {
    record.missing_fields.clear();

    let subject_known = record
        .subject
        .as_deref()
        .is_some_and(|candidate| subjects::subject_is_known(candidate, catalog));
    if !subject_known {
        // The candidate string (if any) stays on the record as a suggestion,
        // but the host must confirm it against a real catalog entry.
        record.missing_fields.push(MissingField::Subject);
    }

    match record.deadline.take().and_then(|raw| normalize_deadline(&raw)) {
        Some(iso) => record.deadline = Some(iso),
        None => record.missing_fields.push(MissingField::Deadline),
    }

    record.confidence = record.confidence.clamp(0.0, 1.0);
}

/// Human-supplied values for the fields flagged as missing.
#[derive(Debug, Default, Clone)]
pub struct MissingFieldValues {
    pub subject: Option<String>,
    pub deadline: Option<String>,
}

/// Merges human-supplied values into the record. Only fields that were
/// flagged missing are touched; everything else keeps its extracted value.
/// The missing-field list is cleared afterwards.
pub fn complete_missing(record: &mut ExtractedRecord, values: MissingFieldValues) {
    if record.missing_fields.contains(&MissingField::Subject) {
        if let Some(subject) = values.subject.as_deref().and_then(clean_field) {
            record.subject = Some(subject);
        }
    }

    if record.missing_fields.contains(&MissingField::Deadline) {
        if let Some(deadline) = values.deadline.as_deref().and_then(normalize_deadline) {
            record.deadline = Some(deadline);
        }
    }

    record.missing_fields.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::{ExtractedRecord, RecordDraft};

    fn entry(name: &str, code: Option<&str>) -> SubjectCatalogEntry {
        SubjectCatalogEntry {
            id: name.to_lowercase(),
            name: name.to_string(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn day_first_dates_normalize() {
        assert_eq!(normalize_deadline("21/3/2025").as_deref(), Some("2025-03-21"));
        assert_eq!(normalize_deadline("1-12-25").as_deref(), Some("2025-12-01"));
    }

    #[test]
    fn iso_dates_pass_through() {
        assert_eq!(normalize_deadline("2025-04-01").as_deref(), Some("2025-04-01"));
    }

    #[test]
    fn invalid_calendar_dates_are_dropped() {
        assert_eq!(normalize_deadline("2025-13-40"), None);
        assert_eq!(normalize_deadline("31/2/2025"), None);
        assert_eq!(normalize_deadline("sometime soon"), None);
    }

    #[test]
    fn generic_formats_are_tried() {
        assert_eq!(
            normalize_deadline("March 21, 2025").as_deref(),
            Some("2025-03-21")
        );
        assert_eq!(
            normalize_deadline("21 March 2025").as_deref(),
            Some("2025-03-21")
        );
    }

    #[test]
    fn reconcile_flags_both_fields_independently() {
        let mut record = ExtractedRecord::from_draft(RecordDraft::default());
        reconcile(&mut record, &[]);
        assert!(record.missing_fields.contains(&MissingField::Subject));
        assert!(record.missing_fields.contains(&MissingField::Deadline));
    }

    #[test]
    fn reconcile_is_idempotent_on_resolved_records() {
        let catalog = vec![entry("Physics", Some("PHYS101"))];
        let mut record = ExtractedRecord::from_draft(RecordDraft::default());
        record.subject = Some("Physics".to_string());
        record.deadline = Some("2025-04-01".to_string());

        reconcile(&mut record, &catalog);
        assert!(record.missing_fields.is_empty());

        let before = record.clone();
        reconcile(&mut record, &catalog);
        assert_eq!(record, before);
    }

    #[test]
    fn complete_missing_merges_only_flagged_fields() {
        let catalog = vec![entry("Physics", None)];
        let mut record = ExtractedRecord::from_draft(RecordDraft::default());
        record.deadline = Some("2025-04-01".to_string());
        reconcile(&mut record, &catalog);
        assert_eq!(record.missing_fields, vec![MissingField::Subject]);

        complete_missing(
            &mut record,
            MissingFieldValues {
                subject: Some("Physics".to_string()),
                deadline: Some("31/12/2099".to_string()),
            },
        );

        assert_eq!(record.subject.as_deref(), Some("Physics"));
        // Deadline was not flagged, so the supplied value is ignored.
        assert_eq!(record.deadline.as_deref(), Some("2025-04-01"));
        assert!(record.missing_fields.is_empty());
    }

    #[test]
    fn complete_missing_normalizes_supplied_deadline() {
        let mut record = ExtractedRecord::from_draft(RecordDraft::default());
        reconcile(&mut record, &[]);

        complete_missing(
            &mut record,
            MissingFieldValues {
                subject: None,
                deadline: Some("21/3/2025".to_string()),
            },
        );

        assert_eq!(record.deadline.as_deref(), Some("2025-03-21"));
        assert!(record.missing_fields.is_empty());
    }
}
