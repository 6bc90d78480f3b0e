//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when embeddings are not configured.
//! - **[`OpenAIProvider`]** — calls the OpenAI embeddings API.
//! - **[`OllamaProvider`]** — calls a local Ollama instance's `/api/embed` endpoint.
//!
//! Also provides vector utilities:
//! - [`cosine_similarity`] — compute similarity between two embedding vectors
//! - [`vec_to_blob`] — encode a `Vec<f32>` as little-endian bytes for SQLite BLOB storage
//! - [`blob_to_vec`] — decode a SQLite BLOB back into a `Vec<f32>`
//!
//! Embedding failures never abort ingestion: callers embed chunk-by-chunk
//! and leave the vector unset for chunks whose call failed.

use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{PlanError, PlanResult};

/// Trait for embedding providers.
///
/// Defines the interface that all embedding backends must implement.
/// The actual embedding computation is performed by [`embed_texts`]
/// (kept as a free function due to async trait limitations).
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
}

/// Embed a batch of texts using the configured provider.
///
/// Dispatches to the appropriate backend based on the config's `provider`
/// field and returns one vector per input text, in input order.
pub async fn embed_texts(
    _provider: &dyn EmbeddingProvider,
    config: &EmbeddingConfig,
    texts: &[String],
) -> PlanResult<Vec<Vec<f32>>> {
    match config.provider.as_str() {
        "openai" => embed_openai(config, texts).await,
        "ollama" => embed_ollama(config, texts).await,
        "disabled" => Err(PlanError::ExternalServiceFailure(
            "embedding provider is disabled".to_string(),
        )),
        other => Err(PlanError::ExternalServiceFailure(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

/// Embed a single query text.
///
/// Convenience wrapper around [`embed_texts`] for single-text use cases
/// (e.g. embedding a search query for semantic ranking).
pub async fn embed_query(
    provider: &dyn EmbeddingProvider,
    config: &EmbeddingConfig,
    text: &str,
) -> PlanResult<Vec<f32>> {
    let results = embed_texts(provider, config, &[text.to_string()]).await?;
    results.into_iter().next().ok_or_else(|| {
        PlanError::ExternalServiceFailure("empty embedding response".to_string())
    })
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"` in the configuration.
pub struct DisabledProvider;

impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls the `POST /v1/embeddings` endpoint with the configured model.
/// Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig) -> PlanResult<Self> {
        let model = config.model.clone().ok_or_else(|| {
            PlanError::ExternalServiceFailure(
                "embedding.model required for OpenAI provider".to_string(),
            )
        })?;
        let dims = config.dims.ok_or_else(|| {
            PlanError::ExternalServiceFailure(
                "embedding.dims required for OpenAI provider".to_string(),
            )
        })?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(PlanError::ExternalServiceFailure(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }

        Ok(Self { model, dims })
    }
}

impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
}

async fn embed_openai(config: &EmbeddingConfig, texts: &[String]) -> PlanResult<Vec<Vec<f32>>> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| PlanError::ExternalServiceFailure("OPENAI_API_KEY not set".to_string()))?;

    let model = config.model.as_ref().ok_or_else(|| {
        PlanError::ExternalServiceFailure("embedding.model required".to_string())
    })?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;

    let body = serde_json::json!({
        "model": model,
        "input": texts,
    });

    let response = client
        .post("https://api.openai.com/v1/embeddings")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(PlanError::ExternalServiceFailure(format!(
            "OpenAI API error {}: {}",
            status, body_text
        )));
    }

    let json: serde_json::Value = response
        .json()
        .await
        .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;
    parse_openai_response(&json)
}

/// Extract the `data[].embedding` arrays from an OpenAI response, in order.
fn parse_openai_response(json: &serde_json::Value) -> PlanResult<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        PlanError::ParseFailure("invalid OpenAI response: missing data array".to_string())
    })?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                PlanError::ParseFailure("invalid OpenAI response: missing embedding".to_string())
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default
/// `http://localhost:11434`). Requires an embedding model to be pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> PlanResult<Self> {
        let model = config.model.clone().ok_or_else(|| {
            PlanError::ExternalServiceFailure(
                "embedding.model required for Ollama provider".to_string(),
            )
        })?;
        let dims = config.dims.ok_or_else(|| {
            PlanError::ExternalServiceFailure(
                "embedding.dims required for Ollama provider".to_string(),
            )
        })?;

        Ok(Self { model, dims })
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
}

async fn embed_ollama(config: &EmbeddingConfig, texts: &[String]) -> PlanResult<Vec<Vec<f32>>> {
    let model = config.model.as_ref().ok_or_else(|| {
        PlanError::ExternalServiceFailure("embedding.model required".to_string())
    })?;

    let url = config.url.as_deref().unwrap_or("http://localhost:11434");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;

    let body = serde_json::json!({
        "model": model,
        "input": texts,
    });

    let response = client
        .post(format!("{}/api/embed", url))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            PlanError::ExternalServiceFailure(format!(
                "Ollama connection error (is Ollama running at {}?): {}",
                url, e
            ))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(PlanError::ExternalServiceFailure(format!(
            "Ollama API error {}: {}",
            status, body_text
        )));
    }

    let json: serde_json::Value = response
        .json()
        .await
        .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;
    parse_ollama_response(&json)
}

fn parse_ollama_response(json: &serde_json::Value) -> PlanResult<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            PlanError::ParseFailure(
                "invalid Ollama response: missing embeddings array".to_string(),
            )
        })?;

    let mut result = Vec::with_capacity(embeddings.len());

    for embedding in embeddings {
        let vec: Vec<f32> = embedding
            .as_array()
            .ok_or_else(|| {
                PlanError::ParseFailure(
                    "invalid Ollama response: embedding is not an array".to_string(),
                )
            })?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        result.push(vec);
    }

    Ok(result)
}

// ============ Provider Factory ============

/// Instantiate the provider named by the configuration.
pub fn create_provider(config: &EmbeddingConfig) -> PlanResult<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config)?)),
        other => Err(PlanError::ExternalServiceFailure(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

// ============ Vector Utilities ============

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths, empty vectors, or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Encode a vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB of little-endian f32 bytes back into a vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
