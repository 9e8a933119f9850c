//! Orchestration layer for IO-bound pipeline services.
//!
//! Modules exposed here coordinate external systems (Pdfium, the OCR engine,
//! the model endpoint) and must avoid embedding pure transforms. Keep
//! stateless helpers in `crate::text`, `crate::pdf`, or the pure
//! `crate::pipeline` modules so resource handling stays localized.

pub mod extraction;
pub mod heuristic;
pub mod ocr;
pub mod reconcile;
pub mod structured;
pub mod subjects;

pub use extraction::{
    DocumentKind, ExtractionError, PDF_MIME_TYPE, SUPPORTED_IMAGE_TYPES, TextExtractionPipeline,
    UploadedFile,
};
pub use ocr::{OcrError, OcrHandle, OcrOutcome, OcrSettings, Recognizer};
pub use reconcile::{MissingFieldValues, complete_missing, normalize_deadline, reconcile};
pub use structured::StructuredExtractor;
pub use subjects::{SubjectCatalogEntry, resolve_subject, subject_is_known};
