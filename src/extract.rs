//! Text extraction from uploaded files.
//!
//! Supports PDF and plain text. PDFs go through `pdf-extract` first, with
//! a per-page `lopdf` pass as fallback for files it chokes on. Plain text
//! must be valid UTF-8; no lossy decoding.

use tracing::{debug, warn};

use crate::error::{PlanError, PlanResult};
use crate::models::FileKind;

/// Determine the file kind from the filename suffix (case-insensitive).
pub fn detect_file_kind(filename: &str) -> PlanResult<FileKind> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        Ok(FileKind::Pdf)
    } else if lower.ends_with(".txt") {
        Ok(FileKind::Txt)
    } else {
        Err(PlanError::UnsupportedFileKind(filename.to_string()))
    }
}

/// Extract text from raw file bytes according to the detected kind.
///
/// Fails with [`PlanError::EmptyContent`] when the result is blank after
/// trimming, so downstream stages never see whitespace-only documents.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> PlanResult<String> {
    let text = match kind {
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Txt => extract_txt(bytes)?,
    };
    if text.trim().is_empty() {
        return Err(PlanError::EmptyContent);
    }
    Ok(text)
}

fn extract_txt(bytes: &[u8]) -> PlanResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| PlanError::ExtractionFailure(format!("invalid UTF-8 in text file: {}", e)))
}

fn extract_pdf(bytes: &[u8]) -> PlanResult<String> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => {
            debug!(chars = text.len(), "extracted pdf text");
            Ok(text)
        }
        Err(primary) => {
            warn!(error = %primary, "primary pdf extraction failed, trying per-page fallback");
            extract_pdf_per_page(bytes).map_err(|fallback| {
                PlanError::ExtractionFailure(format!(
                    "pdf extraction failed: {} (fallback: {})",
                    primary, fallback
                ))
            })
        }
    }
}

/// Per-page extraction via lopdf. Pages that fail individually are skipped
/// so a single bad page does not sink the whole document.
fn extract_pdf_per_page(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let mut pages = Vec::new();
    for number in page_numbers {
        match doc.extract_text(&[number]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!(page = number, error = %e, "skipping unreadable pdf page"),
        }
    }
    if pages.is_empty() {
        return Err("no readable pages".to_string());
    }
    Ok(pages.join("\n"))
}
