//! The document intelligence pipeline: orchestration plus its pure data
//! model and prompt construction.

pub mod prompt;
pub mod record;

use tracing::{debug, instrument};

use crate::config::AppConfig;
use crate::services::extraction::{ExtractionError, TextExtractionPipeline, UploadedFile};
use crate::services::ocr::Recognizer;
use crate::services::reconcile::{self, MissingFieldValues};
use crate::services::structured::StructuredExtractor;
use crate::services::subjects::{self, SubjectCatalogEntry};
use crate::text::cleanup_text;

pub use record::{ExtractedRecord, ExtractionMethod, MissingField, Priority, SubmissionType};

/// End-to-end pipeline from uploaded bytes to a reconciled record.
///
/// Each invocation is independent; the only shared resource is the OCR
/// recognizer, which the host injects and owns.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    extraction: TextExtractionPipeline,
    structured: StructuredExtractor,
}

impl DocumentPipeline {
    pub fn new(config: &AppConfig) -> Self {
        let extraction = TextExtractionPipeline::builder()
            .max_pdf_bytes(config.limits.max_pdf_bytes)
            .max_image_bytes(config.limits.max_image_bytes)
            .render_width(config.limits.render_width)
            .build();

        Self {
            extraction,
            structured: StructuredExtractor::from_config(&config.ai),
        }
    }

    pub fn with_parts(extraction: TextExtractionPipeline, structured: StructuredExtractor) -> Self {
        Self {
            extraction,
            structured,
        }
    }

    /// Runs every stage in order: text extraction, structured extraction,
    /// subject resolution, reconciliation. Fails only when text extraction
    /// exhausts its fallbacks; everything downstream degrades instead.
    #[instrument(skip_all, fields(file = %file.name))]
    pub async fn extract_document(
        &self,
        file: &UploadedFile,
        catalog: &[SubjectCatalogEntry],
        ocr: &dyn Recognizer,
    ) -> Result<ExtractedRecord, ExtractionError> {
        let raw = self.extraction.extract_text(file, ocr).await?;
        let text = cleanup_text(&raw);
        debug!(chars = text.len(), "text extraction complete");

        let mut record = self.structured.extract(&text, catalog).await;

        record.subject = subjects::resolve_subject(&text, record.subject.as_deref(), catalog);
        reconcile::reconcile(&mut record, catalog);

        debug_assert!(record.validate().is_ok(), "pipeline produced invalid record");
        Ok(record)
    }

    /// Merges human-supplied values for the flagged missing fields into an
    /// existing record. Fields that were not flagged are left untouched.
    pub fn complete_missing(record: &mut ExtractedRecord, values: MissingFieldValues) {
        reconcile::complete_missing(record, values);
    }
}
