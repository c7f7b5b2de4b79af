//! Embedding generation over an OpenAI-compatible `/embeddings` endpoint

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client as OpenAIClient,
};
use backoff::ExponentialBackoffBuilder;
use tracing::{debug, info};

use crate::config::EmbeddingSettings;
use crate::{Error, Result};

/// Inputs longer than this many characters are truncated before embedding.
const MAX_INPUT_CHARS: usize = 8000;

/// Service for generating text embeddings
#[derive(Clone)]
pub struct EmbeddingService {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl EmbeddingService {
    /// Create a new embedding service. Fails when no API key is configured.
    ///
    /// Requests are bounded by `settings.timeout` and never retried: a failed
    /// call is reported at once so retrieval can fall back to lexical ranking.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(Error::EmbeddingUnavailable(
                "OPENAI_API_KEY not set".to_string(),
            ));
        }

        let config = OpenAIConfig::new()
            .with_api_key(settings.api_key.clone())
            .with_api_base(settings.base_url.trim_end_matches('/').to_string());
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::EmbeddingUnavailable(format!("HTTP client: {e}")))?;
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = OpenAIClient::with_config(config)
            .with_http_client(http)
            .with_backoff(no_retry);

        Ok(Self {
            client,
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate embedding for a single text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("No embedding returned".to_string()))
    }

    /// Generate embeddings for multiple texts in batch.
    ///
    /// Blank texts get empty vectors and are not sent to the service.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let processed: Vec<String> = texts
            .iter()
            .map(|t| truncate_chars(t.trim(), MAX_INPUT_CHARS))
            .filter(|t| !t.is_empty())
            .collect();

        if processed.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }
        let expected = processed.len();

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(processed))
            .build()
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        info!(
            "Generated {} embeddings, tokens used: {}",
            response.data.len(),
            response.usage.total_tokens
        );

        let mut data = response.data;
        if data.len() != expected {
            return Err(Error::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }
        data.sort_by_key(|e| e.index);

        // Map back to original indices (empty texts get empty vectors)
        let mut result = Vec::with_capacity(texts.len());
        let mut embed_iter = data.into_iter();

        for text in texts {
            if text.trim().is_empty() {
                result.push(Vec::new());
            } else if let Some(embed) = embed_iter.next() {
                result.push(embed.embedding);
            }
        }

        Ok(result)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
