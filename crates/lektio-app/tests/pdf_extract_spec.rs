//! Smoke test for the Pdfium-backed text layer extraction. Skips unless a
//! sample PDF is provided and the Pdfium library is available, so CI without
//! native dependencies stays green.

use std::env;
use std::error::Error;
use std::fs;

use lektio_app::pdf::extract_text_from_pdf;
use lektio_app::text::cleanup_text;

#[test]
fn extracts_text_layer_from_sample_pdf() -> Result<(), Box<dyn Error>> {
    let Ok(path) = env::var("LEKTIO_TEST_PDF") else {
        eprintln!("skipping: LEKTIO_TEST_PDF not set");
        return Ok(());
    };

    let bytes = fs::read(&path)?;
    let text = match extract_text_from_pdf(&bytes) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("skipping: pdfium not available ({err})");
            return Ok(());
        }
    };

    assert!(
        !text.trim().is_empty(),
        "extracted text from {path} should not be empty"
    );

    let cleaned = cleanup_text(&text);
    assert!(
        cleaned.lines().all(|line| line == line.trim()),
        "cleanup should trim every line"
    );

    Ok(())
}
