//! Integration tests for mail_assistant library
//!
//! These tests verify the public API and module interactions.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use mail_assistant::{
    commands::draft_all::draft_replies,
    config::{Config, GenerationSettings},
    error::Error,
    prompts::{build_reply_prompt, EMPATHY_CLAUSE, NO_CONTEXT_PLACEHOLDER, URGENCY_CLAUSE},
    rag::{Embedder, KnowledgeBase, LocalEmbedder, RetrievalMode, Retriever},
    triage::{load_inbox, triage_inbox, InboxStats, Priority},
    ReplyClient, ReplyRequest, ReplyService, REPLY_FAILURE_PREFIX,
};

fn generation(base_url: &str, api_key: &str) -> GenerationSettings {
    GenerationSettings {
        base_url: base_url.to_string(),
        api_key: api_key.to_string(),
        model: "llama-3.1-8b-instant".to_string(),
        timeout: Duration::from_secs(5),
        temperature: None,
        max_tokens: None,
    }
}

fn kb(entries: &[&str]) -> KnowledgeBase {
    KnowledgeBase::from_entries(entries.iter().copied())
}

fn texts(entries: &[mail_assistant::RetrievedEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.text.as_str()).collect()
}

// ============================================================================
// Retrieval Tests
// ============================================================================

#[tokio::test]
async fn test_empty_corpus_returns_empty_context() {
    let lexical = Retriever::lexical(KnowledgeBase::default());
    assert!(lexical.retrieve("anything at all", 2).await.is_empty());

    let embedder = Embedder::Local(LocalEmbedder::new(64));
    let vector = Retriever::build(KnowledgeBase::default(), Some(embedder)).await;
    assert!(vector.retrieve("anything at all", 2).await.is_empty());
}

#[tokio::test]
async fn test_lexical_excludes_zero_matches() {
    let retriever = Retriever::lexical(kb(&["billing issue", "login problem"]));
    assert!(retriever.retrieve("refund", 2).await.is_empty());
}

#[tokio::test]
async fn test_lexical_ranking_order() {
    let retriever = Retriever::lexical(kb(&[
        "password reset help",
        "billing invoice query",
        "general info",
    ]));

    let hits = retriever.retrieve("password help", 2).await;
    assert_eq!(texts(&hits), vec!["password reset help"]);
    assert_eq!(hits[0].score, 2.0);
}

#[tokio::test]
async fn test_top_k_saturation() {
    let retriever = Retriever::lexical(kb(&["a b", "b c", "c d"]));
    let hits = retriever.retrieve("a b c d", 10).await;
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn test_vector_mode_with_local_embedder() {
    let retriever = Retriever::build(
        kb(&["reset password from login page", "invoices are sent monthly"]),
        Some(Embedder::Local(LocalEmbedder::new(256))),
    )
    .await;
    assert_eq!(retriever.mode(), RetrievalMode::Vector);

    let hits = retriever.retrieve("password reset", 1).await;
    assert_eq!(texts(&hits), vec!["reset password from login page"]);
}

#[test]
fn test_knowledge_base_load_missing_file_is_empty() {
    let kb = KnowledgeBase::load("/definitely/not/here.txt").unwrap();
    assert!(kb.is_empty());
}

#[test]
fn test_knowledge_base_load_strips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("faq.txt");
    fs::write(&path, "  first  \n\n\t\nsecond\n").unwrap();

    let kb = KnowledgeBase::load(&path).unwrap();
    assert_eq!(kb.entries(), &["first".to_string(), "second".to_string()]);
}

// ============================================================================
// Prompt Tests
// ============================================================================

#[test]
fn test_conditional_prompt_clauses() {
    let both = build_reply_prompt(
        &ReplyRequest::new("s", "b", "Negative", "Urgent"),
        &["ctx"],
    );
    assert!(both.contains(EMPATHY_CLAUSE));
    assert!(both.contains(URGENCY_CLAUSE));

    let neither = build_reply_prompt(
        &ReplyRequest::new("s", "b", "Neutral", "Normal"),
        &["ctx"],
    );
    assert!(!neither.contains(EMPATHY_CLAUSE));
    assert!(!neither.contains(URGENCY_CLAUSE));
}

#[test]
fn test_prompt_rendering_is_idempotent() {
    let request = ReplyRequest::new("Order", "Where is it?", "negative", "URGENT");
    let empty: [&str; 0] = [];
    assert_eq!(
        build_reply_prompt(&request, &empty),
        build_reply_prompt(&request, &empty)
    );
    assert!(build_reply_prompt(&request, &empty).contains(NO_CONTEXT_PLACEHOLDER));
}

// ============================================================================
// Reply Service Tests
// ============================================================================

#[tokio::test]
async fn test_generate_reply_never_fails() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(503).body("overloaded");
    });

    let failing = ReplyService::new(
        Retriever::lexical(kb(&["shipping takes 3 days"])),
        ReplyClient::new(&generation(&server.base_url(), "key")),
        2,
    );
    let unconfigured = ReplyService::new(
        Retriever::lexical(KnowledgeBase::default()),
        ReplyClient::new(&generation("http://127.0.0.1:9", "")),
        2,
    );

    for (subject, body) in [("", ""), ("\u{0}", "\n\n"), ("shipping?", "ship 🚚 now")] {
        for svc in [&failing, &unconfigured] {
            let reply = svc.generate_reply(subject, body, "", "").await;
            assert!(reply.starts_with(REPLY_FAILURE_PREFIX), "got: {reply}");
        }
    }
}

#[tokio::test]
async fn test_reply_service_end_to_end() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("Authorization", "Bearer key")
            .is_true(|req| {
                let body = String::from_utf8_lossy(req.body().as_ref());
                body.contains("Refunds are processed within 5 business days.")
                    && body.contains(r#""role":"user""#)
            });
        then.status(200).json_body(json!({
            "choices": [ { "message": { "role": "assistant", "content": "\n Your refund is on its way. \n" } } ]
        }));
    });

    let svc = ReplyService::new(
        Retriever::lexical(kb(&[
            "Refunds are processed within 5 business days.",
            "Our office is closed on Sundays.",
        ])),
        ReplyClient::new(&generation(&server.base_url(), "key")),
        2,
    );

    let reply = svc
        .generate_reply("Refund", "When will my refund arrive?", "Negative", "Normal")
        .await;
    assert_eq!(reply, "Your refund is on its way.");
    mock.assert_calls(1);
}

#[tokio::test]
async fn test_strict_api_reports_configuration_error() {
    let svc = ReplyService::new(
        Retriever::lexical(KnowledgeBase::default()),
        ReplyClient::new(&generation("http://127.0.0.1:9", "")),
        2,
    );
    let err = svc
        .try_generate_reply(&ReplyRequest::new("s", "b", "Neutral", "Normal"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn test_service_is_shareable_across_tasks() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(json!({
            "choices": [ { "message": { "role": "assistant", "content": "ok" } } ]
        }));
    });

    let svc = Arc::new(ReplyService::new(
        Retriever::lexical(kb(&["faq entry"])),
        ReplyClient::new(&generation(&server.base_url(), "key")),
        2,
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                svc.generate_reply("s", &format!("question {i}"), "Neutral", "Normal")
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), "ok");
    }
    mock.assert_calls(8);
}

// ============================================================================
// Triage Pipeline Tests
// ============================================================================

const INBOX: &str = "\
sender,subject,body,sent_date
alice.smith@example.com,Support needed,Thanks for the quick help yesterday,2024-06-01 09:00:00
bob@example.com,Urgent request,I cannot access my account and my login fails,2024-06-01 10:00:00
carol@example.com,Team lunch,See you at noon,2024-06-01 11:00:00
bob@example.com,Billing query,My invoice is wrong. Reach me at bob.alt@example.org,2024-05-20 08:00:00
";

#[tokio::test]
async fn test_inbox_triage_and_drafting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("emails.csv");
    fs::write(&path, INBOX).unwrap();

    let config = Config::defaults();
    let records = load_inbox(&path).unwrap();
    let emails = triage_inbox(&records, Some(config.support_keywords.as_slice()));

    assert_eq!(emails.len(), 3);
    assert_eq!(emails[0].priority, Priority::Urgent);
    assert_eq!(emails[0].subject, "Urgent request");
    assert_eq!(emails[2].alt_email.as_deref(), Some("bob.alt@example.org"));

    let now = chrono::DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let stats = InboxStats::compute(&emails, now);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.last_24h, 2);
    assert_eq!(stats.top_senders[0].sender, "bob@example.com");
    assert_eq!(stats.top_senders[0].count, 2);

    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(json!({
            "choices": [ { "message": { "role": "assistant", "content": "Drafted." } } ]
        }));
    });
    let svc = Arc::new(ReplyService::new(
        Retriever::lexical(kb(&["Account recovery is available at /recover."])),
        ReplyClient::new(&generation(&server.base_url(), "key")),
        2,
    ));

    let drafts = draft_replies(svc, emails, 3).await;
    assert_eq!(drafts.len(), 3);
    assert_eq!(drafts[0].subject, "Urgent request");
    assert!(drafts.iter().all(|d| d.reply == "Drafted." && !d.failed));
}
