//! Reply prompt rendering.
//!
//! The rendered text is the contract with the generation service: the
//! conditional clauses and the verbatim echo of the email fields must stay
//! in place, wording may change.

use crate::reply::ReplyRequest;

pub const ROLE_INSTRUCTION: &str = "You are a professional AI support assistant.";

/// Added only for negative sentiment.
pub const EMPATHY_CLAUSE: &str =
    "The customer appears frustrated: acknowledge their frustration politely.";

/// Added only for urgent priority.
pub const URGENCY_CLAUSE: &str = "This is URGENT: provide immediate next steps.";

/// Context block content when retrieval found nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No KB context available.";

pub const OUTPUT_INSTRUCTION: &str =
    "Provide only the reply body (no analysis, no commentary about these instructions).";

/// Render the reply prompt. Pure and deterministic.
pub fn build_reply_prompt<S: AsRef<str>>(request: &ReplyRequest, context: &[S]) -> String {
    let context_text = if context.is_empty() {
        NO_CONTEXT_PLACEHOLDER.to_string()
    } else {
        context
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut guidelines = vec!["Maintain a professional, empathetic, and concise tone."];
    if request.sentiment.eq_ignore_ascii_case("negative") {
        guidelines.push(EMPATHY_CLAUSE);
    }
    if request.priority.eq_ignore_ascii_case("urgent") {
        guidelines.push(URGENCY_CLAUSE);
    }
    guidelines.push("Use the knowledge base context if helpful.");
    guidelines.push("Reference any products mentioned in the email.");
    guidelines.push("Keep the reply to 5-8 sentences and end with a polite sign-off.");

    let guidelines = guidelines
        .iter()
        .map(|g| format!("- {g}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{ROLE_INSTRUCTION}\n\n\
         Guidelines:\n{guidelines}\n\n\
         Context:\n{context_text}\n\n\
         Email Subject: {subject}\n\
         Email Body: {body}\n\
         Sentiment: {sentiment}\n\
         Priority: {priority}\n\n\
         {OUTPUT_INSTRUCTION}\n",
        subject = request.subject,
        body = request.body,
        sentiment = request.sentiment,
        priority = request.priority,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sentiment: &str, priority: &str) -> ReplyRequest {
        ReplyRequest::new("Login issue", "I cannot log in.", sentiment, priority)
    }

    #[test]
    fn negative_urgent_includes_both_clauses() {
        let prompt = build_reply_prompt(&request("Negative", "Urgent"), &[] as &[String]);
        assert!(prompt.contains(EMPATHY_CLAUSE));
        assert!(prompt.contains(URGENCY_CLAUSE));
    }

    #[test]
    fn neutral_normal_includes_neither_clause() {
        let prompt = build_reply_prompt(&request("Neutral", "Normal"), &[] as &[String]);
        assert!(!prompt.contains(EMPATHY_CLAUSE));
        assert!(!prompt.contains(URGENCY_CLAUSE));
    }

    #[test]
    fn clause_matching_is_case_insensitive() {
        let prompt = build_reply_prompt(&request("NEGATIVE", "urgent"), &[] as &[String]);
        assert!(prompt.contains(EMPATHY_CLAUSE));
        assert!(prompt.contains(URGENCY_CLAUSE));

        let prompt = build_reply_prompt(&request("Positive", "High"), &[] as &[String]);
        assert!(!prompt.contains(EMPATHY_CLAUSE));
        assert!(!prompt.contains(URGENCY_CLAUSE));
    }

    #[test]
    fn empty_context_uses_placeholder() {
        let prompt = build_reply_prompt(&request("Neutral", "Normal"), &[] as &[String]);
        assert!(prompt.contains(&format!("Context:\n{NO_CONTEXT_PLACEHOLDER}")));
    }

    #[test]
    fn context_entries_are_newline_joined() {
        let prompt = build_reply_prompt(
            &request("Neutral", "Normal"),
            &["Reset passwords at /reset.", "Support hours are 9-5."],
        );
        assert!(prompt.contains("Context:\nReset passwords at /reset.\nSupport hours are 9-5.\n"));
        assert!(!prompt.contains(NO_CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn fields_are_echoed_verbatim() {
        let req = ReplyRequest::new("  Odd  subject ", "Body\nwith lines", "weird", "custom");
        let prompt = build_reply_prompt(&req, &[] as &[String]);

        assert!(prompt.contains("Email Subject:   Odd  subject \n"));
        assert!(prompt.contains("Email Body: Body\nwith lines\n"));
        assert!(prompt.contains("Sentiment: weird\n"));
        assert!(prompt.contains("Priority: custom\n"));
        assert!(prompt.starts_with(ROLE_INSTRUCTION));
        assert!(prompt.trim_end().ends_with(OUTPUT_INSTRUCTION));
    }

    #[test]
    fn rendering_is_idempotent() {
        let req = request("Negative", "Urgent");
        let context = vec!["entry".to_string()];
        assert_eq!(build_reply_prompt(&req, &context), build_reply_prompt(&req, &context));
    }
}
