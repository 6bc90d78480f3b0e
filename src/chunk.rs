//! Paragraph-boundary text chunker.
//!
//! Splits document text into [`Chunk`]s that respect a configurable
//! character limit. Splitting occurs only on paragraph boundaries (`\n\n`):
//! chunk size is a soft target, paragraph integrity is hard. A single
//! paragraph longer than the limit is emitted whole rather than split
//! mid-paragraph.
//!
//! # Algorithm
//!
//! 1. Split text on `\n\n` paragraph boundaries.
//! 2. Trim each paragraph; skip empty ones.
//! 3. Accumulate paragraphs into a buffer (rejoined with `\n\n`) until
//!    adding the next paragraph would exceed `max_chars`.
//! 4. When exceeded, flush the buffer as a chunk and start a new one with
//!    that paragraph.
//! 5. Flush the final non-empty buffer.

use uuid::Uuid;

use crate::models::Chunk;

/// Split text into chunks on paragraph boundaries, respecting `max_chars`.
///
/// Returns non-empty chunks with contiguous indices starting at 0, each with
/// a fresh UUID and no embedding. Empty or whitespace-only input yields an
/// empty vector.
pub fn chunk_text(document_id: &str, text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current_buf = String::new();
    // Limit counts characters, not bytes.
    let mut current_chars = 0usize;
    let mut chunk_index: i64 = 0;

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let para_chars = trimmed.chars().count();
        let would_be = if current_buf.is_empty() {
            para_chars
        } else {
            current_chars + 2 + para_chars
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(make_chunk(document_id, chunk_index, &current_buf));
            chunk_index += 1;
            current_buf.clear();
            current_chars = 0;
        }

        if !current_buf.is_empty() {
            current_buf.push_str("\n\n");
            current_chars += 2;
        }
        current_buf.push_str(trimmed);
        current_chars += para_chars;
    }

    if !current_buf.is_empty() {
        chunks.push(make_chunk(document_id, chunk_index, &current_buf));
    }

    chunks
}

fn make_chunk(document_id: &str, index: i64, text: &str) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        embedding: None,
    }
}
