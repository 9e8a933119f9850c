//! Application-level error type shared by the binary.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppConfigError;
use crate::services::extraction::ExtractionError;
use crate::services::ocr::OcrError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ConfigLoad(#[from] AppConfigError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot determine file type for {path} (unknown extension)")]
    UnknownFileType { path: PathBuf },
}
