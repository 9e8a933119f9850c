//! Configuration loading and XDG path helpers.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::services::ocr::OcrSettings;

const CONFIG_FILE: &str = "config/settings";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub ocr: OcrSettings,
    pub limits: LimitsConfig,
}

/// Generative-model settings. The key is optional: without one, every
/// extraction silently runs the local heuristic path.
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
    pub max_prompt_chars: usize,
}

/// Upload ceilings and the render width used for the OCR fallback.
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_pdf_bytes: usize,
    pub max_image_bytes: usize,
    pub render_width: u32,
}

pub fn load() -> Result<AppConfig, AppConfigError> {
    let builder = Config::builder()
        .set_default("ai.model", "gemini-2.0-flash")?
        .set_default("ai.request_timeout_secs", 30_i64)?
        .set_default("ai.max_prompt_chars", 15_000_i64)?
        .set_default("ocr.language", "eng")?
        .set_default("limits.max_pdf_bytes", 20 * 1024 * 1024_i64)?
        .set_default("limits.max_image_bytes", 10 * 1024 * 1024_i64)?
        .set_default("limits.render_width", 2048_i64)?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("LEKTIO").separator("__"));

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}

pub fn project_dirs() -> Result<ProjectDirs, AppConfigError> {
    ProjectDirs::from("dev", "lektio", "lektio").ok_or(AppConfigError::MissingProjectDirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_config_file() {
        let cfg = load().expect("defaults build");
        assert_eq!(cfg.ai.model, "gemini-2.0-flash");
        assert_eq!(cfg.limits.max_pdf_bytes, 20 * 1024 * 1024);
        assert_eq!(cfg.ocr.language, "eng");
    }
}
