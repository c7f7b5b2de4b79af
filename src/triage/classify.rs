//! Keyword-based tagging of email text.

use serde::Serialize;
use std::fmt;

const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "critical",
    "cannot access",
    "as soon as possible",
];
const HIGH_KEYWORDS: &[&str] = &["reminder", "follow up", "pending"];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "angry",
    "frustrated",
    "disappointed",
    "not happy",
    "hate",
    "bad",
    "terrible",
    "worst",
    "complaint",
    "problem",
    "not working",
];
const POSITIVE_KEYWORDS: &[&str] = &[
    "thank",
    "great",
    "happy",
    "love",
    "excellent",
    "appreciate",
    "good job",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Priority {
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Normal => "Normal",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the sender needs, by topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Requirement {
    #[serde(rename = "Account Access")]
    AccountAccess,
    Billing,
    #[serde(rename = "Technical Issue")]
    TechnicalIssue,
    #[serde(rename = "Support Request")]
    SupportRequest,
    General,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::AccountAccess => "Account Access",
            Requirement::Billing => "Billing",
            Requirement::TechnicalIssue => "Technical Issue",
            Requirement::SupportRequest => "Support Request",
            Requirement::General => "General",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

pub fn classify_priority(text: &str) -> Priority {
    let text = text.to_lowercase();
    if contains_any(&text, URGENT_KEYWORDS) {
        Priority::Urgent
    } else if contains_any(&text, HIGH_KEYWORDS) {
        Priority::High
    } else {
        Priority::Normal
    }
}

/// Negative keywords win over positive ones.
pub fn classify_sentiment(text: &str) -> Sentiment {
    let text = text.to_lowercase();
    if contains_any(&text, NEGATIVE_KEYWORDS) {
        Sentiment::Negative
    } else if contains_any(&text, POSITIVE_KEYWORDS) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

pub fn classify_requirement(text: &str) -> Requirement {
    let text = text.to_lowercase();
    if contains_any(&text, &["password", "login"]) {
        Requirement::AccountAccess
    } else if contains_any(&text, &["payment", "invoice", "billing"]) {
        Requirement::Billing
    } else if contains_any(&text, &["error", "bug", "not working"]) {
        Requirement::TechnicalIssue
    } else if contains_any(&text, &["support", "help", "query", "request"]) {
        Requirement::SupportRequest
    } else {
        Requirement::General
    }
}
