use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::embedder::Embedder;
use super::knowledge_base::KnowledgeBase;
use crate::{metrics, Error, Result};

/// Retrieval strategy in effect for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Dot product between query and corpus embeddings
    Vector,
    /// Count of query tokens occurring in the entry
    Lexical,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Vector => "vector",
            RetrievalMode::Lexical => "lexical",
        }
    }
}

/// A knowledge-base entry selected for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedEntry {
    /// Position in the knowledge base
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Index into a scored collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIdx {
    pub idx: usize,
    pub score: f32,
}

enum Strategy {
    Vector {
        embedder: Embedder,
        vectors: Vec<Vec<f32>>,
    },
    Lexical,
}

/// Ranks knowledge-base entries against a query.
///
/// The strategy is fixed at construction. A query embedding failure
/// switches the retriever to lexical scoring for the rest of its life.
pub struct Retriever {
    knowledge: KnowledgeBase,
    strategy: Strategy,
    vector_disabled: AtomicBool,
}

impl Retriever {
    /// Lexical-only retriever.
    pub fn lexical(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge,
            strategy: Strategy::Lexical,
            vector_disabled: AtomicBool::new(false),
        }
    }

    /// Embed the whole corpus once and pick the strategy.
    ///
    /// Without an embedder, with an empty corpus, or when corpus embedding
    /// fails, the retriever is lexical.
    pub async fn build(knowledge: KnowledgeBase, embedder: Option<Embedder>) -> Self {
        let Some(embedder) = embedder else {
            return Self::lexical(knowledge);
        };
        if knowledge.is_empty() {
            return Self::lexical(knowledge);
        }

        match embedder.encode(knowledge.entries()).await {
            Ok(vectors) => match Self::with_vectors(knowledge.clone(), embedder, vectors) {
                Ok(retriever) => {
                    info!(
                        entries = knowledge.len(),
                        embedder = retriever.embedder_name().unwrap_or_default(),
                        "Knowledge base embedded, vector retrieval enabled"
                    );
                    retriever
                }
                Err(err) => {
                    warn!("Corpus embedding unusable, using lexical retrieval ({err})");
                    Self::lexical(knowledge)
                }
            },
            Err(err) => {
                warn!("Corpus embedding failed, using lexical retrieval ({err})");
                Self::lexical(knowledge)
            }
        }
    }

    /// Vector retriever over precomputed corpus vectors (one per entry).
    pub fn with_vectors(
        knowledge: KnowledgeBase,
        embedder: Embedder,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if vectors.len() != knowledge.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "{} vectors for {} knowledge base entries",
                vectors.len(),
                knowledge.len()
            )));
        }

        Ok(Self {
            knowledge,
            strategy: Strategy::Vector { embedder, vectors },
            vector_disabled: AtomicBool::new(false),
        })
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Backend of the vector strategy, `None` for a lexical-only retriever.
    pub fn embedder_name(&self) -> Option<&'static str> {
        match &self.strategy {
            Strategy::Vector { embedder, .. } => Some(embedder.name()),
            Strategy::Lexical => None,
        }
    }

    /// Strategy that the next call will use.
    pub fn mode(&self) -> RetrievalMode {
        match self.strategy {
            Strategy::Vector { .. } if !self.vector_disabled.load(AtomicOrdering::Relaxed) => {
                RetrievalMode::Vector
            }
            _ => RetrievalMode::Lexical,
        }
    }

    /// Return up to `top_k` entries, most relevant first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedEntry> {
        if self.knowledge.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let (mode, ranked) = match &self.strategy {
            Strategy::Vector { embedder, vectors } if self.mode() == RetrievalMode::Vector => {
                match embedder.encode_one(query).await {
                    Ok(q) => (RetrievalMode::Vector, rank_by_dot_product(vectors, &q, top_k)),
                    Err(err) => {
                        warn!("Query embedding failed, switching to lexical retrieval ({err})");
                        self.vector_disabled.store(true, AtomicOrdering::Relaxed);
                        (
                            RetrievalMode::Lexical,
                            rank_by_token_overlap(self.knowledge.entries(), query, top_k),
                        )
                    }
                }
            }
            _ => (
                RetrievalMode::Lexical,
                rank_by_token_overlap(self.knowledge.entries(), query, top_k),
            ),
        };

        metrics::record_retrieval(mode.as_str());
        debug!(mode = mode.as_str(), hits = ranked.len(), "Retrieved context");

        ranked
            .into_iter()
            .filter_map(|s| {
                self.knowledge.get(s.idx).map(|text| RetrievedEntry {
                    index: s.idx,
                    text: text.to_string(),
                    score: s.score,
                })
            })
            .collect()
    }
}

/// Raw dot product. Mismatched or empty vectors score 0.0.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Top `top_k` corpus vectors by dot product with `query`, highest first.
/// Equal scores keep the lower index first.
pub fn rank_by_dot_product(vectors: &[Vec<f32>], query: &[f32], top_k: usize) -> Vec<ScoredIdx> {
    let scored = vectors
        .iter()
        .enumerate()
        .map(|(idx, v)| ScoredIdx {
            idx,
            score: dot_product(v, query),
        })
        .collect();
    top_k_stable(scored, top_k)
}

/// Number of (lowercased, whitespace-split) query tokens found as substrings
/// of the lowercased entry. Repeated tokens count once per occurrence.
pub fn lexical_score(entry: &str, query: &str) -> usize {
    let entry = entry.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| entry.contains(token))
        .count()
}

/// Top `top_k` entries by lexical score, zero scores excluded.
pub fn rank_by_token_overlap(entries: &[String], query: &str, top_k: usize) -> Vec<ScoredIdx> {
    let scored = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| ScoredIdx {
            idx,
            score: lexical_score(entry, query) as f32,
        })
        .filter(|s| s.score > 0.0)
        .collect();
    top_k_stable(scored, top_k)
}

fn top_k_stable(mut scored: Vec<ScoredIdx>, top_k: usize) -> Vec<ScoredIdx> {
    // sort_by is stable: ties keep ascending index order
    scored.sort_by(|a, b| rank_key(b.score).total_cmp(&rank_key(a.score)));
    scored.truncate(top_k);
    scored
}

/// NaN ranks below every real score; -0.0 ties with 0.0.
fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score + 0.0
    }
}
