//! Optical character recognition behind a dedicated worker thread.
//!
//! The Tesseract engine handle is not `Send`, and recognition calls must
//! never overlap, so the engine lives on its own thread and callers talk to
//! it through a channel handle. The engine itself is created lazily on the
//! first recognition and reused for the rest of the process lifetime;
//! `shutdown` releases it explicitly.

use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use flume::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;
use tracing::error;

/// OCR worker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language model, e.g. `eng`.
    pub language: String,
    /// Optional override for the tessdata directory.
    #[serde(default)]
    pub datapath: Option<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            datapath: None,
        }
    }
}

/// Outcome of a single recognition pass.
#[derive(Debug, Clone, Serialize)]
pub struct OcrOutcome {
    pub text: String,
    /// Engine confidence rescaled from the native 0-100 range into [0, 1].
    pub confidence: f32,
    pub elapsed_ms: u64,
}

/// Errors produced by the OCR worker.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to initialize the OCR engine: {0}")]
    Init(String),
    #[error("optical recognition failed: {0}; retry with a clearer, higher-contrast image")]
    Recognition(String),
    #[error("OCR worker is no longer running")]
    WorkerGone,
    #[error("this build does not include OCR support (enable the `ocr` feature)")]
    Unavailable,
}

/// Anything able to turn image bytes into text. The pipeline depends on this
/// seam rather than the concrete engine so tests can inject a stub.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutcome, OcrError>;
}

enum OcrCmd {
    Recognize {
        image: Vec<u8>,
        resp: Sender<Result<OcrOutcome, OcrError>>,
    },
    Stop,
}

/// Channel handle to the OCR worker thread.
pub struct OcrHandle {
    tx: Sender<OcrCmd>,
    join: Option<JoinHandle<()>>,
}

impl OcrHandle {
    /// Spawns the worker thread. The engine itself is not created until the
    /// first recognition request arrives.
    pub fn spawn(settings: OcrSettings) -> Self {
        let (tx, rx) = flume::bounded::<OcrCmd>(1);
        let join = Some(thread::spawn(move || run_worker(rx, settings)));
        Self { tx, join }
    }

    pub async fn recognize(&self, image: Vec<u8>) -> Result<OcrOutcome, OcrError> {
        let (resp_tx, resp_rx) = flume::bounded(1);
        self.tx
            .send_async(OcrCmd::Recognize {
                image,
                resp: resp_tx,
            })
            .await
            .map_err(|_| OcrError::WorkerGone)?;
        resp_rx.recv_async().await.map_err(|_| OcrError::WorkerGone)?
    }

    /// Stops the worker and releases the engine.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.tx.send_async(OcrCmd::Stop).await {
            error!("failed to send stop to OCR worker: {err}");
        }
        if let Some(join) = self.join.take() {
            let _ = task::spawn_blocking(move || {
                let _ = join.join();
            })
            .await;
        }
    }
}

impl Drop for OcrHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let tx = self.tx.clone();
            thread::spawn(move || {
                let _ = tx.send(OcrCmd::Stop);
                let _ = join.join();
            });
        }
    }
}

#[async_trait]
impl Recognizer for OcrHandle {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutcome, OcrError> {
        OcrHandle::recognize(self, image.to_vec()).await
    }
}

#[cfg(feature = "ocr")]
fn run_worker(rx: Receiver<OcrCmd>, settings: OcrSettings) {
    use std::time::Instant;

    use tesseract::Tesseract;

    let mut engine: Option<Tesseract> = None;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            OcrCmd::Recognize { image, resp } => {
                let started = Instant::now();
                let result = recognize_blocking(&mut engine, &settings, &image, started);
                let _ = resp.send(result);
            }
            OcrCmd::Stop => break,
        }
    }
}

#[cfg(feature = "ocr")]
fn recognize_blocking(
    slot: &mut Option<tesseract::Tesseract>,
    settings: &OcrSettings,
    image: &[u8],
    started: std::time::Instant,
) -> Result<OcrOutcome, OcrError> {
    use tesseract::Tesseract;
    use tracing::debug;

    let engine = match slot.take() {
        Some(engine) => engine,
        None => {
            debug!(language = %settings.language, "initializing OCR engine");
            Tesseract::new(settings.datapath.as_deref(), Some(&settings.language))
                .map_err(|err| OcrError::Init(err.to_string()))?
        }
    };

    // On failure the engine is dropped and recreated on the next request.
    let mut engine = engine
        .set_image_from_mem(image)
        .map_err(|err| OcrError::Recognition(err.to_string()))?;

    let text = engine
        .get_text()
        .map_err(|err| OcrError::Recognition(err.to_string()))?;
    let raw_confidence = engine.mean_text_conf();
    *slot = Some(engine);

    let confidence = raw_confidence.clamp(0, 100) as f32 / 100.0;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(confidence, elapsed_ms, "recognition complete");

    Ok(OcrOutcome {
        text,
        confidence,
        elapsed_ms,
    })
}

#[cfg(not(feature = "ocr"))]
fn run_worker(rx: Receiver<OcrCmd>, _settings: OcrSettings) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            OcrCmd::Recognize { resp, .. } => {
                let _ = resp.send(Err(OcrError::Unavailable));
            }
            OcrCmd::Stop => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_joins_cleanly_without_engine_init() {
        let handle = OcrHandle::spawn(OcrSettings::default());
        handle.shutdown().await;
    }

    #[cfg(not(feature = "ocr"))]
    #[tokio::test]
    async fn recognize_reports_unavailable_without_feature() {
        let handle = OcrHandle::spawn(OcrSettings::default());
        let err = handle.recognize(vec![0u8; 4]).await.expect_err("no engine");
        assert!(matches!(err, OcrError::Unavailable));
        handle.shutdown().await;
    }
}
