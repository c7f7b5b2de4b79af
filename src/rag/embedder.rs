//! Optional embedding capability used by vector retrieval.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{info, warn};

use super::embeddings::EmbeddingService;
use crate::config::{EmbeddingBackend, EmbeddingSettings};
use crate::Result;

/// Converts texts to fixed-length vectors. One vector per input, same order.
#[derive(Debug, Clone)]
pub enum Embedder {
    /// OpenAI-compatible embedding endpoint
    Remote(EmbeddingService),
    /// Deterministic hashed embeddings (offline)
    Local(LocalEmbedder),
}

impl Embedder {
    /// Try to construct the configured embedder.
    ///
    /// Construction failure is not fatal: it is logged and `None` is
    /// returned, which selects lexical retrieval.
    pub fn from_settings(settings: &EmbeddingSettings) -> Option<Self> {
        match settings.backend {
            EmbeddingBackend::None => {
                info!("Embeddings disabled, using lexical retrieval");
                None
            }
            EmbeddingBackend::Local => {
                let local = LocalEmbedder::new(settings.dimension);
                info!(dimension = local.dimension(), "Using local hashed embeddings");
                Some(Embedder::Local(local))
            }
            EmbeddingBackend::OpenAI => match EmbeddingService::new(settings) {
                Ok(service) => {
                    info!(model = service.model(), "Using remote embeddings");
                    Some(Embedder::Remote(service))
                }
                Err(err) => {
                    warn!("Embedder unavailable, falling back to lexical retrieval ({err})");
                    None
                }
            },
        }
    }

    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Embedder::Remote(service) => service.embed_batch(texts).await,
            Embedder::Local(local) => Ok(texts.iter().map(|t| local.embed(t)).collect()),
        }
    }

    pub async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Embedder::Remote(service) => service.embed(text).await,
            Embedder::Local(local) => Ok(local.embed(text)),
        }
    }

    /// Backend label used in logs and command output.
    pub fn name(&self) -> &'static str {
        match self {
            Embedder::Remote(_) => "remote",
            Embedder::Local(_) => "local",
        }
    }
}

/// Deterministic, fast embedding for offline/local use.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    /// Hashed bag of lowercase tokens, L2-normalised.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dim;
            vec[idx] += 1.0;
        }

        normalize(&mut vec);
        vec
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }
}

pub(crate) fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(backend: EmbeddingBackend, api_key: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            backend,
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 32,
            timeout: std::time::Duration::from_secs(1),
        }
    }

    #[test]
    fn local_embedder_produces_consistent_embeddings() {
        let embedder = LocalEmbedder::new(64);
        let text = "reset password login";

        let emb1 = embedder.embed(text);
        let emb2 = embedder.embed(text);

        assert_eq!(emb1, emb2);
        assert_eq!(emb1.len(), 64);
    }

    #[test]
    fn local_embedder_is_case_insensitive() {
        let embedder = LocalEmbedder::new(64);
        assert_eq!(embedder.embed("Invoice"), embedder.embed("invoice"));
    }

    #[test]
    fn local_embedder_respects_minimum_dimension() {
        assert_eq!(LocalEmbedder::new(0).dimension(), 8);
    }

    #[test]
    fn local_embedder_empty_text_is_zero_vector() {
        let emb = LocalEmbedder::new(32).embed("");
        assert_eq!(emb.len(), 32);
        assert!(emb.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_scales_vector_to_unit_length() {
        let mut vec = vec![3.0, 4.0];
        normalize(&mut vec);
        let norm = (vec[0].powi(2) + vec[1].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_settings_selects_backend() {
        assert!(Embedder::from_settings(&settings(EmbeddingBackend::None, "key")).is_none());
        assert!(matches!(
            Embedder::from_settings(&settings(EmbeddingBackend::Local, "")),
            Some(Embedder::Local(_))
        ));
        assert!(matches!(
            Embedder::from_settings(&settings(EmbeddingBackend::OpenAI, "key")),
            Some(Embedder::Remote(_))
        ));
    }

    #[test]
    fn remote_without_key_is_absorbed() {
        assert!(Embedder::from_settings(&settings(EmbeddingBackend::OpenAI, "")).is_none());
    }

    #[tokio::test]
    async fn encode_returns_one_vector_per_input() {
        let embedder = Embedder::Local(LocalEmbedder::new(16));
        let vectors = embedder
            .encode(&["a b".to_string(), "c".to_string(), "".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 16));
        assert_eq!(embedder.name(), "local");
    }

    #[tokio::test]
    async fn encode_one_matches_batch_encoding() {
        let embedder = Embedder::Local(LocalEmbedder::new(16));
        let one = embedder.encode_one("reset my password").await.unwrap();
        let batch = embedder
            .encode(&["reset my password".to_string()])
            .await
            .unwrap();
        assert_eq!(vec![one], batch);
    }
}
