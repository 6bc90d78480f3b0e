//! Document ingestion pipeline.
//!
//! Takes raw file bytes through extraction, validation, chunking, and
//! embedding, then persists the document and its chunk set. Embedding is
//! best-effort: a failed embedding call skips that chunk's vector and the
//! ingestion still succeeds. Validation failures reject the whole upload
//! before anything is written.

use tracing::{info, warn};
use uuid::Uuid;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::{self, create_provider};
use crate::error::{PlanError, PlanResult};
use crate::extract::{detect_file_kind, extract_text};
use crate::models::{Chunk, Document};
use crate::store::PlanStore;

/// Minimum non-whitespace characters a document must contain.
pub const MIN_CONTENT_CHARS: usize = 100;

/// What an ingestion produced.
#[derive(Debug)]
pub struct IngestOutcome {
    pub document: Document,
    pub chunk_count: usize,
    pub embedded_count: usize,
}

/// Ingest a file from disk. See [`ingest_bytes`].
pub async fn ingest_file(
    store: &dyn PlanStore,
    config: &Config,
    user_id: &str,
    path: &std::path::Path,
) -> PlanResult<IngestOutcome> {
    let bytes = std::fs::read(path)
        .map_err(|e| PlanError::ExtractionFailure(format!("cannot read {}: {}", path.display(), e)))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PlanError::UnsupportedFileKind(path.display().to_string()))?;
    ingest_bytes(store, config, user_id, filename, &bytes).await
}

/// Ingest raw file bytes for a user.
///
/// Rejects unsupported kinds, unreadable files, and documents shorter than
/// [`MIN_CONTENT_CHARS`] non-whitespace characters. On success the document
/// and its chunks (with whatever embeddings succeeded) are persisted
/// atomically per table.
pub async fn ingest_bytes(
    store: &dyn PlanStore,
    config: &Config,
    user_id: &str,
    filename: &str,
    bytes: &[u8],
) -> PlanResult<IngestOutcome> {
    let kind = detect_file_kind(filename)?;
    let content = extract_text(kind, bytes)?;

    let meaningful = content.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_CONTENT_CHARS {
        return Err(PlanError::ContentTooShort {
            min: MIN_CONTENT_CHARS,
        });
    }

    let document = Document {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        filename: filename.to_string(),
        file_kind: kind.as_str().to_string(),
        file_size: bytes.len() as i64,
        content: content.clone(),
        created_at: chrono::Utc::now().timestamp(),
    };

    let mut chunks = chunk_text(&document.id, &content, config.chunking.max_chars);
    let embedded_count = if config.embedding.is_enabled() {
        embed_chunks(config, &mut chunks).await?
    } else {
        0
    };

    store.create_document(&document).await?;
    store.replace_chunks(&document.id, &chunks).await?;

    info!(
        document_id = %document.id,
        filename,
        chunks = chunks.len(),
        embedded = embedded_count,
        "document ingested"
    );

    Ok(IngestOutcome {
        document,
        chunk_count: chunks.len(),
        embedded_count,
    })
}

/// Embed chunks one at a time so a single failure only costs that chunk
/// its vector. Returns how many chunks got one.
async fn embed_chunks(config: &Config, chunks: &mut [Chunk]) -> PlanResult<usize> {
    let provider = create_provider(&config.embedding)?;
    let mut embedded = 0;

    for chunk in chunks.iter_mut() {
        match embedding::embed_query(provider.as_ref(), &config.embedding, &chunk.text).await {
            Ok(vector) => {
                chunk.embedding = Some(vector);
                embedded += 1;
            }
            Err(e) => {
                warn!(
                    chunk_index = chunk.chunk_index,
                    error = %e,
                    "embedding failed, chunk stored without vector"
                );
            }
        }
    }

    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn config() -> Config {
        toml::from_str("[db]\npath = \"./data/test.db\"\n").unwrap()
    }

    fn long_text() -> String {
        "This project builds a scheduling platform for a small clinic.\n\n\
         It needs appointment booking, reminders, and a reporting dashboard \
         for the front desk staff to review weekly utilization."
            .to_string()
    }

    #[tokio::test]
    async fn ingests_txt_and_persists_chunks() {
        let store = MemoryStore::new();
        let outcome = ingest_bytes(&store, &config(), "alice", "clinic.txt", long_text().as_bytes())
            .await
            .unwrap();

        assert_eq!(outcome.document.file_kind, "txt");
        assert!(outcome.chunk_count >= 1);
        assert_eq!(outcome.embedded_count, 0);

        let doc = store
            .get_document("alice", &outcome.document.id)
            .await
            .unwrap();
        assert_eq!(doc.filename, "clinic.txt");

        let chunks = store.get_chunks(&outcome.document.id).await.unwrap();
        assert_eq!(chunks.len(), outcome.chunk_count);
    }

    #[tokio::test]
    async fn rejects_short_documents() {
        let store = MemoryStore::new();
        let err = ingest_bytes(&store, &config(), "alice", "tiny.txt", b"too small to plan from")
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::ContentTooShort { min: 100 }));
    }

    #[tokio::test]
    async fn whitespace_does_not_count_toward_minimum() {
        let store = MemoryStore::new();
        let padded = format!("short{}", " \n\t".repeat(200));
        let err = ingest_bytes(&store, &config(), "alice", "padded.txt", padded.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::ContentTooShort { .. }));
    }

    #[tokio::test]
    async fn rejects_unsupported_kind() {
        let store = MemoryStore::new();
        let err = ingest_bytes(&store, &config(), "alice", "plan.docx", long_text().as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedFileKind(_)));
    }
}
