//! Mail Assistant Library
//!
//! This library provides tools to:
//! - Triage a support inbox exported as CSV (priority, sentiment, requirement)
//! - Extract contact details and summary statistics from emails
//! - Retrieve knowledge-base context for an email (vector or lexical ranking)
//! - Draft context-grounded replies through an OpenAI-compatible chat service
//! - Expose Prometheus metrics for CLI runs

pub mod config;
pub mod error;
pub mod integrations;
pub mod metrics;
pub mod prompts;
pub mod rag;
pub mod reply;
pub mod triage;

// Re-export common types
pub use config::Config;
pub use error::{Error, Result};
pub use integrations::ReplyClient;
pub use rag::{KnowledgeBase, RetrievalMode, RetrievedEntry, Retriever};
pub use reply::{ReplyRequest, ReplyService, REPLY_FAILURE_PREFIX};
pub use triage::{EmailRecord, InboxStats, Priority, Requirement, Sentiment, TriagedEmail};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
