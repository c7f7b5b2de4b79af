//! `draft-all`: draft replies for every triaged inbox email.
//!
//! Replies are generated concurrently against one shared [`ReplyService`];
//! output keeps the triage order. A failed draft carries the failure text
//! in place of the reply and does not stop the run.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::info;

use super::{load_triaged, persist, render_structured, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::reply::{ReplyService, REPLY_FAILURE_PREFIX};
use crate::triage::{Priority, Requirement, Sentiment, TriagedEmail};

/// Draft-all configuration
#[derive(Debug, Clone)]
pub struct DraftAllConfig {
    pub inbox: Option<PathBuf>,
    pub all: bool,
    /// Replies in flight at once
    pub concurrency: usize,
    pub limit: Option<usize>,
    pub format: String,
    pub output: Option<PathBuf>,
}

impl Default for DraftAllConfig {
    fn default() -> Self {
        Self {
            inbox: None,
            all: false,
            concurrency: 4,
            limit: None,
            format: "json".to_string(),
            output: None,
        }
    }
}

/// A drafted reply next to the email it answers.
#[derive(Debug, Clone, Serialize)]
pub struct DraftedReply {
    pub sender: String,
    pub subject: String,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub requirement: Requirement,
    pub reply: String,
    pub failed: bool,
}

pub async fn run(config: &Config, options: DraftAllConfig) -> Result<Vec<DraftedReply>> {
    let fmt = OutputFormat::parse(&options.format)?;
    let mut emails = load_triaged(config, options.inbox.as_ref(), options.all)?;
    if let Some(limit) = options.limit {
        emails.truncate(limit);
    }

    let service = Arc::new(ReplyService::from_config(config).await);
    let drafts = draft_replies(service, emails, options.concurrency).await;

    let failed = drafts.iter().filter(|d| d.failed).count();
    info!(drafted = drafts.len() - failed, failed, "Draft run finished");

    let payload = match fmt {
        OutputFormat::Table => render_text(&drafts),
        _ => render_structured(fmt, &drafts)?,
    };
    match &options.output {
        Some(path) => {
            persist(path, &payload)?;
            println!("Saved {} drafts to {}", drafts.len(), path.display());
        }
        None => println!("{payload}"),
    }

    Ok(drafts)
}

/// Generate one reply per email, at most `concurrency` at a time.
pub async fn draft_replies(
    service: Arc<ReplyService>,
    emails: Vec<TriagedEmail>,
    concurrency: usize,
) -> Vec<DraftedReply> {
    stream::iter(emails.into_iter().map(|email| {
        let service = Arc::clone(&service);
        async move {
            let reply = service.generate(&email.reply_request()).await;
            DraftedReply {
                failed: reply.starts_with(REPLY_FAILURE_PREFIX),
                sender: email.sender,
                subject: email.subject,
                priority: email.priority,
                sentiment: email.sentiment,
                requirement: email.requirement,
                reply,
            }
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}

fn render_text(drafts: &[DraftedReply]) -> String {
    let mut out = String::new();
    for (idx, draft) in drafts.iter().enumerate() {
        out.push_str(&format!(
            "#{} [{} / {} / {}] {} <{}>\n",
            idx, draft.priority, draft.sentiment, draft.requirement, draft.subject, draft.sender
        ));
        out.push_str(&draft.reply);
        out.push_str("\n\n");
    }
    out
}
