//! Reply drafting pipeline: retrieve context, render prompt, call the model.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::integrations::ReplyClient;
use crate::prompts::build_reply_prompt;
use crate::rag::{Embedder, KnowledgeBase, RetrievedEntry, Retriever};
use crate::{metrics, Error, Result};

/// Prefix of the text returned instead of a reply when drafting fails.
pub const REPLY_FAILURE_PREFIX: &str = "(Reply generation failed: ";

/// The email fields a reply is drafted from.
///
/// Sentiment and priority are opaque labels; only a case-insensitive
/// comparison against "negative" / "urgent" changes the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub subject: String,
    pub body: String,
    pub sentiment: String,
    pub priority: String,
}

impl ReplyRequest {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sentiment: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sentiment: sentiment.into(),
            priority: priority.into(),
        }
    }
}

/// Text shown to the user in place of a reply.
pub fn failure_message(err: &Error) -> String {
    format!("{REPLY_FAILURE_PREFIX}{err})")
}

/// Failure text for a panic caught while drafting. Counted under the
/// `panic` status so reply totals still add up.
fn panic_failure_text(panic: &(dyn Any + Send), elapsed: Duration) -> String {
    metrics::record_reply("panic", elapsed);
    let cause = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "internal error".to_string());
    warn!("Reply generation panicked: {cause}");
    format!("{REPLY_FAILURE_PREFIX}{cause})")
}

/// Process-wide reply service. Holds only immutable state after
/// construction and can be shared across tasks behind an `Arc`.
pub struct ReplyService {
    retriever: Retriever,
    client: ReplyClient,
    top_k: usize,
}

impl ReplyService {
    pub fn new(retriever: Retriever, client: ReplyClient, top_k: usize) -> Self {
        Self {
            retriever,
            client,
            top_k: top_k.max(1),
        }
    }

    /// Build every component from configuration. Never fails: a missing
    /// knowledge base, embedder or credential degrades the service instead.
    pub async fn from_config(config: &Config) -> Self {
        let knowledge = KnowledgeBase::load(&config.knowledge_base_path).unwrap_or_else(|err| {
            warn!(
                path = %config.knowledge_base_path.display(),
                "Failed to read knowledge base, continuing without context: {err}"
            );
            KnowledgeBase::default()
        });
        let embedder = Embedder::from_settings(&config.embeddings);
        let retriever = Retriever::build(knowledge, embedder).await;
        let client = ReplyClient::new(&config.generation);

        info!(
            entries = retriever.knowledge().len(),
            mode = retriever.mode().as_str(),
            embedder = retriever.embedder_name().unwrap_or("none"),
            model = client.model(),
            credential = client.is_configured(),
            "Reply service ready"
        );

        Self::new(retriever, client, config.top_k)
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn client(&self) -> &ReplyClient {
        &self.client
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedEntry> {
        self.retriever.retrieve(query, top_k).await
    }

    /// Retrieve context for the body and render the prompt, without calling the model.
    pub async fn render_prompt(&self, request: &ReplyRequest) -> String {
        let context: Vec<String> = self
            .retriever
            .retrieve(&request.body, self.top_k)
            .await
            .into_iter()
            .map(|entry| entry.text)
            .collect();
        build_reply_prompt(request, &context)
    }

    /// Strict API: the reply, or the typed reason it could not be drafted.
    pub async fn try_generate_reply(&self, request: &ReplyRequest) -> Result<String> {
        let start = Instant::now();
        let prompt = self.render_prompt(request).await;
        let result = self.client.complete(&prompt).await;

        let status = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        metrics::record_reply(status, start.elapsed());
        debug!(status, elapsed_ms = start.elapsed().as_millis() as u64, "Reply generation finished");

        result
    }

    /// Like [`ReplyService::try_generate_reply`], but gives up with
    /// [`Error::Cancelled`] as soon as `cancel` completes. The pending HTTP
    /// request is dropped; shared state is not touched.
    pub async fn try_generate_reply_until<F>(&self, request: &ReplyRequest, cancel: F) -> Result<String>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                metrics::record_reply(Error::Cancelled.kind(), Duration::ZERO);
                Err(Error::Cancelled)
            }
            result = self.try_generate_reply(request) => result,
        }
    }

    /// Never-failing API: a reply, or a failure description starting with
    /// [`REPLY_FAILURE_PREFIX`].
    pub async fn generate(&self, request: &ReplyRequest) -> String {
        let start = Instant::now();
        match AssertUnwindSafe(self.try_generate_reply(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(kind = err.kind(), "Reply generation failed: {err}");
                failure_message(&err)
            }
            Err(panic) => panic_failure_text(panic.as_ref(), start.elapsed()),
        }
    }

    /// Public entry point for the inbox front end.
    pub async fn generate_reply(
        &self,
        subject: &str,
        body: &str,
        sentiment: &str,
        priority: &str,
    ) -> String {
        self.generate(&ReplyRequest::new(subject, body, sentiment, priority))
            .await
    }
}
