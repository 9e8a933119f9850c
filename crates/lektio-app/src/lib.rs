//! Lektio turns an uploaded assignment or exam document into a structured,
//! confidence-scored record.
//!
//! The pipeline runs in stages: text extraction (PDF text layer with OCR
//! fallbacks), structured extraction (model-backed with a deterministic local
//! fallback), subject-catalog resolution, and field reconciliation that
//! decides which required fields still need a human.

pub mod cli;
pub mod config;
pub mod error;
pub mod pdf;
pub mod pipeline;
pub mod services;
pub mod text;
