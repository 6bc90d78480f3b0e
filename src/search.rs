//! Similarity ranking over embedded chunks.
//!
//! Ranks a document's chunks against a query vector by cosine similarity.
//! Chunks without embeddings are skipped. Ordering is deterministic: ties
//! keep chunk order (stable sort), so repeated queries over unchanged data
//! return the same ranking.

use crate::config::Config;
use crate::embedding::{self, cosine_similarity, EmbeddingProvider};
use crate::error::PlanResult;
use crate::models::Chunk;

/// A chunk paired with its similarity score against a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Rank chunks against a query vector, returning the top `k` by cosine
/// similarity (descending). Chunks with no embedding are skipped.
pub fn rank_chunks(query_vec: &[f32], chunks: &[Chunk], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_ref()?;
            Some(ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(query_vec, embedding),
            })
        })
        .collect();

    // Vec::sort_by is stable, so equal scores keep chunk order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Embed a query and return the top-k most similar chunks.
///
/// This is the retrieval step used to assemble context for LLM prompts.
pub async fn relevant_chunks(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    query: &str,
    chunks: &[Chunk],
    k: usize,
) -> PlanResult<Vec<ScoredChunk>> {
    let query_vec = embedding::embed_query(provider, &config.embedding, query).await?;
    Ok(rank_chunks(&query_vec, chunks, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: i64, text: &str, embedding: Option<Vec<f32>>) -> Chunk {
        Chunk {
            id: format!("c{}", index),
            document_id: "doc1".to_string(),
            chunk_index: index,
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn ranks_by_similarity_descending() {
        let chunks = vec![
            chunk(0, "far", Some(vec![0.0, 1.0])),
            chunk(1, "near", Some(vec![1.0, 0.0])),
            chunk(2, "mid", Some(vec![1.0, 1.0])),
        ];
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 3);
        assert_eq!(ranked[0].chunk.text, "near");
        assert_eq!(ranked[1].chunk.text, "mid");
        assert_eq!(ranked[2].chunk.text, "far");
    }

    #[test]
    fn truncates_to_k() {
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk(i, "t", Some(vec![1.0, i as f32])))
            .collect();
        assert_eq!(rank_chunks(&[1.0, 0.0], &chunks, 3).len(), 3);
    }

    #[test]
    fn skips_unembedded_chunks() {
        let chunks = vec![
            chunk(0, "no vector", None),
            chunk(1, "has vector", Some(vec![1.0, 0.0])),
        ];
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.text, "has vector");
    }

    #[test]
    fn empty_input_yields_empty() {
        assert!(rank_chunks(&[1.0, 0.0], &[], 5).is_empty());
    }

    #[test]
    fn ties_keep_chunk_order() {
        let chunks = vec![
            chunk(0, "first", Some(vec![1.0, 0.0])),
            chunk(1, "second", Some(vec![2.0, 0.0])),
            chunk(2, "third", Some(vec![3.0, 0.0])),
        ];
        // All three are parallel to the query, so all scores are 1.0.
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 3);
        assert_eq!(ranked[0].chunk.text, "first");
        assert_eq!(ranked[1].chunk.text, "second");
        assert_eq!(ranked[2].chunk.text, "third");
    }
}
