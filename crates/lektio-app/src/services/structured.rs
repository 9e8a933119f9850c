//! Structured extraction: model-backed with a deterministic local fallback.
//!
//! The extractor never fails. When no credential is configured, or the model
//! call errors, times out, or returns something that does not parse, the
//! heuristic extractor produces a lower-trust record instead. The caller
//! always gets something to review.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use bon::Builder;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::pipeline::prompt::build_prompt;
use crate::pipeline::record::{ExtractedRecord, RecordDraft};
use crate::services::heuristic;
use crate::services::subjects::SubjectCatalogEntry;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Errors internal to the model path. Never surfaced to callers; they only
/// decide when the heuristic fallback engages.
#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response contained no text")]
    EmptyResponse,
    #[error("model response was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Model-backed extractor with heuristic fallback.
#[derive(Debug, Clone, Builder)]
pub struct StructuredExtractor {
    #[builder(into)]
    pub model: String,
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,
    #[builder(default = 15_000)]
    pub max_prompt_chars: usize,
    #[builder(default = default_client(request_timeout))]
    client: Client,
    #[builder(default = default_backoff())]
    backoff: ExponentialBuilder,
}

fn default_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(2)
        .with_jitter()
}

impl StructuredExtractor {
    /// Builds an extractor from configuration. A missing key is resolved
    /// from the conventional environment variables; if none is found the
    /// extractor silently serves heuristic results.
    pub fn from_config(config: &AiConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_AI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        Self::builder()
            .model(config.model.clone())
            .maybe_api_key(api_key)
            .request_timeout(Duration::from_secs(config.request_timeout_secs))
            .max_prompt_chars(config.max_prompt_chars)
            .build()
    }

    /// Produces a draft record for the document text. The catalog is passed
    /// only as a prompt hint at this stage; authoritative resolution happens
    /// later. Infallible by design: every model-path failure degrades to the
    /// heuristic extractor.
    pub async fn extract(&self, text: &str, catalog: &[SubjectCatalogEntry]) -> ExtractedRecord {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("no model credential configured; using heuristic extraction");
            return heuristic::extract(text);
        };

        match self.extract_with_model(text, catalog, api_key).await {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "model extraction failed; falling back to heuristics");
                heuristic::extract(text)
            }
        }
    }

    async fn extract_with_model(
        &self,
        text: &str,
        catalog: &[SubjectCatalogEntry],
        api_key: &str,
    ) -> Result<ExtractedRecord, AiError> {
        let truncated = truncate_chars(text, self.max_prompt_chars);
        let known_subjects = catalog
            .iter()
            .map(|entry| entry.name.clone())
            .collect::<Vec<_>>();
        let prompt = build_prompt(truncated, &known_subjects);

        let attempt = || async {
            self.call_model(api_key, &prompt.system_message, &prompt.user_message)
                .await
        };
        let raw = attempt.retry(self.backoff.clone()).await?;

        let payload = strip_code_fence(&raw);
        let draft: RecordDraft = serde_json::from_str(payload)?;
        Ok(ExtractedRecord::from_draft(draft))
    }

    async fn call_model(
        &self,
        api_key: &str,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_message }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_message }] }],
            "generationConfig": { "temperature": 0.0, "responseMimeType": "application/json" }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: GenerateContentResponse = response.json().await?;
        let text = decoded
            .candidates
            .into_iter()
            .flatten()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .flatten()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Models sometimes wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Truncates on a character boundary so long documents fit the model context.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
