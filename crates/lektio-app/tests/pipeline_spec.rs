//! End-to-end pipeline behaviour with a stubbed recognizer and no model
//! credential, so every scenario runs the deterministic path.

use async_trait::async_trait;

use lektio_app::pipeline::{DocumentPipeline, ExtractionMethod, MissingField, Priority};
use lektio_app::services::extraction::{ExtractionError, TextExtractionPipeline, UploadedFile};
use lektio_app::services::ocr::{OcrError, OcrOutcome, Recognizer};
use lektio_app::services::structured::StructuredExtractor;
use lektio_app::services::subjects::SubjectCatalogEntry;

struct StaticRecognizer {
    text: &'static str,
}

#[async_trait]
impl Recognizer for StaticRecognizer {
    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutcome, OcrError> {
        Ok(OcrOutcome {
            text: self.text.to_string(),
            confidence: 0.9,
            elapsed_ms: 1,
        })
    }
}

struct FailingRecognizer;

#[async_trait]
impl Recognizer for FailingRecognizer {
    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutcome, OcrError> {
        Err(OcrError::Recognition("blurry input".to_string()))
    }
}

fn pipeline() -> DocumentPipeline {
    let structured = StructuredExtractor::builder().model("gemini-2.0-flash").build();
    DocumentPipeline::with_parts(TextExtractionPipeline::default(), structured)
}

fn image_upload(text_irrelevant: &str) -> UploadedFile {
    UploadedFile {
        name: "page.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: text_irrelevant.as_bytes().to_vec(),
    }
}

fn catalog() -> Vec<SubjectCatalogEntry> {
    vec![
        SubjectCatalogEntry {
            id: "math".to_string(),
            name: "Mathematics".to_string(),
            code: Some("MATH101".to_string()),
        },
        SubjectCatalogEntry {
            id: "phys".to_string(),
            name: "Physics".to_string(),
            code: Some("PHYS101".to_string()),
        },
    ]
}

#[tokio::test]
async fn labelled_document_populates_every_field() {
    let ocr = StaticRecognizer {
        text: "Assignment: Lab Report\nDue: 2025-04-01\nSubject: Physics",
    };
    let record = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &ocr)
        .await
        .expect("extraction succeeds");

    assert_eq!(record.title, "Lab Report");
    assert_eq!(record.deadline.as_deref(), Some("2025-04-01"));
    assert_eq!(record.subject.as_deref(), Some("Physics"));
    assert_eq!(record.extraction_method, ExtractionMethod::Heuristic);
    assert_eq!(record.confidence, 0.7);
    // The deadline is long past, so days-until-deadline lands in the
    // most-urgent bucket.
    assert_eq!(record.priority, Priority::High);
    assert!(record.missing_fields.is_empty());
    assert!((0.0..=1.0).contains(&record.confidence));
}

#[tokio::test]
async fn distant_deadline_relaxes_priority() {
    let ocr = StaticRecognizer {
        text: "Assignment: Capstone\nDue: 2099-01-01\nSubject: Physics",
    };
    let record = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &ocr)
        .await
        .expect("extraction succeeds");

    assert_eq!(record.priority, Priority::Low);
}

#[tokio::test]
async fn unsupported_mime_is_rejected_before_recognition() {
    let file = UploadedFile {
        name: "notes.txt".to_string(),
        mime_type: "text/plain".to_string(),
        bytes: b"plain text".to_vec(),
    };
    // A recognizer that would fail loudly if it were ever consulted.
    let err = pipeline()
        .extract_document(&file, &catalog(), &FailingRecognizer)
        .await
        .expect_err("validation rejects the file");

    assert!(matches!(
        err,
        ExtractionError::UnsupportedType { mime_type } if mime_type == "text/plain"
    ));
}

#[tokio::test]
async fn partial_subject_guess_resolves_against_catalog() {
    let ocr = StaticRecognizer {
        text: "Assignment: Problem Set 4\nDue: 2099-05-01\nSubject: Math",
    };
    let record = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &ocr)
        .await
        .expect("extraction succeeds");

    assert_eq!(record.subject.as_deref(), Some("Mathematics"));
    assert!(!record.missing_fields.contains(&MissingField::Subject));
}

#[tokio::test]
async fn document_without_deadline_flags_it_and_defaults_priority() {
    let ocr = StaticRecognizer {
        text: "Assignment: Essay draft\nSubject: Physics\nWrite two pages.",
    };
    let record = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &ocr)
        .await
        .expect("extraction succeeds");

    assert!(record.missing_fields.contains(&MissingField::Deadline));
    assert_eq!(record.deadline, None);
    assert_eq!(record.priority, Priority::Medium);
}

#[tokio::test]
async fn unknown_subject_is_flagged_but_kept_as_suggestion() {
    let ocr = StaticRecognizer {
        text: "Assignment: Field notes\nDue: 2099-02-01\nSubject: Botany",
    };
    let record = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &ocr)
        .await
        .expect("extraction succeeds");

    assert_eq!(record.subject.as_deref(), Some("Botany"));
    assert!(record.missing_fields.contains(&MissingField::Subject));
}

#[tokio::test]
async fn failed_recognition_surfaces_as_terminal_error() {
    let err = pipeline()
        .extract_document(&image_upload("ignored"), &catalog(), &FailingRecognizer)
        .await
        .expect_err("image OCR failure is terminal");

    assert!(matches!(err, ExtractionError::Ocr(_)));
    assert!(err.to_string().contains("clearer"));
}
