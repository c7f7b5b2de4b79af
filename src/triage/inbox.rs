//! CSV inbox ingestion and per-email triage.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use super::classify::{
    classify_priority, classify_requirement, classify_sentiment, Priority, Requirement, Sentiment,
};
use super::contacts::{extract_email, extract_phone, preview, sender_name};
use crate::reply::ReplyRequest;
use crate::Result;

const PREVIEW_CHARS: usize = 50;

/// One row of the inbox export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmailRecord {
    #[serde(default, alias = "from")]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(
        default,
        alias = "date",
        alias = "sentdate",
        alias = "sent date",
        deserialize_with = "deserialize_sent_date"
    )]
    pub sent_date: Option<DateTime<Utc>>,
}

/// An email with its tags and extracted contact details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriagedEmail {
    pub sender: String,
    pub sender_name: String,
    pub subject: String,
    pub body: String,
    pub sent_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub requirement: Requirement,
    pub phone: Option<String>,
    pub alt_email: Option<String>,
    pub preview: String,
}

impl TriagedEmail {
    pub fn reply_request(&self) -> ReplyRequest {
        ReplyRequest::new(
            self.subject.clone(),
            self.body.clone(),
            self.sentiment.as_str(),
            self.priority.as_str(),
        )
    }
}

fn deserialize_sent_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_sent_date))
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or `YYYY-MM-DD`. Anything else is `None`.
pub fn parse_sent_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read inbox rows from CSV. Header names are matched case-insensitively.
pub fn read_inbox<R: Read>(reader: R) -> Result<Vec<EmailRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    rdr.set_headers(headers);

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    debug!("Read {} inbox rows", records.len());
    Ok(records)
}

pub fn load_inbox<P: AsRef<Path>>(path: P) -> Result<Vec<EmailRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = read_inbox(file)?;
    info!(path = %path.as_ref().display(), emails = records.len(), "Inbox loaded");
    Ok(records)
}

/// Tag one email. Priority, sentiment and requirement come from the body.
pub fn triage_email(record: &EmailRecord) -> TriagedEmail {
    TriagedEmail {
        sender: record.sender.clone(),
        sender_name: sender_name(&record.sender),
        subject: record.subject.clone(),
        body: record.body.clone(),
        sent_date: record.sent_date,
        priority: classify_priority(&record.body),
        sentiment: classify_sentiment(&record.body),
        requirement: classify_requirement(&record.body),
        phone: extract_phone(&record.body),
        alt_email: extract_email(&record.body),
        preview: preview(&record.body, PREVIEW_CHARS),
    }
}

/// Subject mentions one of the support keywords (case-insensitive).
pub fn is_support_email(subject: &str, keywords: &[String]) -> bool {
    let subject = subject.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && subject.contains(&k.to_lowercase()))
}

/// Tag every email, optionally keep only support emails, urgent first.
pub fn triage_inbox(records: &[EmailRecord], support_keywords: Option<&[String]>) -> Vec<TriagedEmail> {
    let mut emails: Vec<TriagedEmail> = records
        .iter()
        .filter(|r| support_keywords.map_or(true, |k| is_support_email(&r.subject, k)))
        .map(triage_email)
        .collect();
    // stable: original order kept within each group
    emails.sort_by_key(|e| e.priority != Priority::Urgent);
    emails
}
