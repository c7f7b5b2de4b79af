//! Retrieval-augmented context for reply drafting.
//!
//! A static knowledge base is loaded once, optionally embedded once, and
//! then ranked against each incoming email body:
//! - vector mode when an embedder is available (dot product ranking)
//! - lexical fallback otherwise (query-token overlap, zero scores dropped)

pub mod embedder;
pub mod embeddings;
pub mod knowledge_base;
pub mod retriever;

pub use embedder::{Embedder, LocalEmbedder};
pub use embeddings::EmbeddingService;
pub use knowledge_base::KnowledgeBase;
pub use retriever::{RetrievalMode, RetrievedEntry, Retriever};
