//! Multi-stage text extraction from an uploaded file.
//!
//! The ladder runs from cheap and exact to expensive and lossy: a PDF's text
//! layer is free when present, so OCR is reserved for scanned pages. Image
//! uploads go straight to OCR. File type and size are validated before any
//! extraction work begins.

use bon::Builder;
use thiserror::Error;
use tokio::task;
use tracing::{debug, warn};

use crate::pdf::{self, PdfRenderError};
use crate::services::ocr::{OcrError, Recognizer};

/// MIME types the pipeline accepts for image uploads.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file handed to the pipeline by the host application's picker. The MIME
/// type is the declared one; the pipeline does not sniff content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Validated document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

/// Errors emitted by the text extraction ladder.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("{name} is too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    PdfRender(#[from] PdfRenderError),

    #[error("could not extract text from {name}: {reason}")]
    Exhausted { name: String, reason: String },

    #[error("extraction task join failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Extraction parameters. Defaults match typical upload ceilings: PDFs in
/// the low tens of megabytes, images somewhat smaller, and an upscaled
/// render width for the OCR fallback.
#[derive(Debug, Clone, Builder)]
pub struct TextExtractionPipeline {
    #[builder(default = 20 * 1024 * 1024)]
    pub max_pdf_bytes: usize,
    #[builder(default = 10 * 1024 * 1024)]
    pub max_image_bytes: usize,
    #[builder(default = 2048)]
    pub render_width: u32,
}

impl Default for TextExtractionPipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TextExtractionPipeline {
    /// Validates the file, then runs the extraction ladder. Fails only when
    /// every applicable fallback strategy has failed.
    pub async fn extract_text(
        &self,
        file: &UploadedFile,
        ocr: &dyn Recognizer,
    ) -> Result<String, ExtractionError> {
        match self.classify(file)? {
            DocumentKind::Pdf => self.extract_pdf_text(file, ocr).await,
            DocumentKind::Image => {
                debug!(name = %file.name, "running OCR on image upload");
                let outcome = ocr.recognize(&file.bytes).await?;
                Ok(outcome.text)
            }
        }
    }

    /// Validates the declared MIME type and size before any extraction work.
    pub fn classify(&self, file: &UploadedFile) -> Result<DocumentKind, ExtractionError> {
        if file.mime_type == PDF_MIME_TYPE {
            if file.bytes.len() > self.max_pdf_bytes {
                return Err(ExtractionError::TooLarge {
                    name: file.name.clone(),
                    size: file.bytes.len(),
                    limit: self.max_pdf_bytes,
                });
            }
            return Ok(DocumentKind::Pdf);
        }

        if SUPPORTED_IMAGE_TYPES.contains(&file.mime_type.as_str()) {
            if file.bytes.len() > self.max_image_bytes {
                return Err(ExtractionError::TooLarge {
                    name: file.name.clone(),
                    size: file.bytes.len(),
                    limit: self.max_image_bytes,
                });
            }
            return Ok(DocumentKind::Image);
        }

        Err(ExtractionError::UnsupportedType {
            mime_type: file.mime_type.clone(),
        })
    }

    async fn extract_pdf_text(
        &self,
        file: &UploadedFile,
        ocr: &dyn Recognizer,
    ) -> Result<String, ExtractionError> {
        let bytes = file.bytes.clone();
        let text_layer = task::spawn_blocking(move || pdf::extract_text_from_pdf(&bytes)).await?;

        match text_layer {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                debug!(name = %file.name, "PDF has no text layer; rasterizing page 1 for OCR");
                let bytes = file.bytes.clone();
                let width = self.render_width;
                let page =
                    task::spawn_blocking(move || pdf::render_pdf_page_to_png(&bytes, 0, width))
                        .await??;
                let outcome = ocr.recognize(&page.png_data).await?;
                Ok(outcome.text)
            }
            Err(err) => {
                // Parser failure, not an empty text layer. One last attempt:
                // hand the original bytes to the recognizer directly.
                warn!(name = %file.name, error = %err, "PDF text extraction failed; trying direct OCR");
                match ocr.recognize(&file.bytes).await {
                    Ok(outcome) => Ok(outcome.text),
                    Err(ocr_err) => Err(ExtractionError::Exhausted {
                        name: file.name.clone(),
                        reason: format!("{err}; direct OCR fallback: {ocr_err}"),
                    }),
                }
            }
        }
    }
}
