//! Inbox summary numbers.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::classify::{Priority, Sentiment};
use super::inbox::TriagedEmail;

const TOP_SENDERS: usize = 5;
const DAILY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboxStats {
    pub total: usize,
    pub last_24h: usize,
    pub urgent: usize,
    pub high: usize,
    pub normal: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub by_requirement: BTreeMap<String, usize>,
    pub top_senders: Vec<SenderCount>,
    /// Emails per UTC calendar day, today and the six days before.
    /// Every day of the window is present, quiet days with 0.
    pub last_7_days: BTreeMap<NaiveDate, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    pub sender: String,
    pub count: usize,
}

impl InboxStats {
    /// Summarize `emails`; "last 24 hours" is relative to `now`.
    pub fn compute(emails: &[TriagedEmail], now: DateTime<Utc>) -> Self {
        let since = now - Duration::hours(24);
        let mut stats = InboxStats {
            total: emails.len(),
            ..Default::default()
        };
        let today = now.date_naive();
        stats.last_7_days = (0..DAILY_WINDOW_DAYS)
            .map(|back| (today - Duration::days(back), 0))
            .collect();
        let mut senders: HashMap<&str, usize> = HashMap::new();

        for email in emails {
            if let Some(sent) = email.sent_date.filter(|d| *d <= now) {
                if sent >= since {
                    stats.last_24h += 1;
                }
                if let Some(count) = stats.last_7_days.get_mut(&sent.date_naive()) {
                    *count += 1;
                }
            }
            match email.priority {
                Priority::Urgent => stats.urgent += 1,
                Priority::High => stats.high += 1,
                Priority::Normal => stats.normal += 1,
            }
            match email.sentiment {
                Sentiment::Positive => stats.positive += 1,
                Sentiment::Negative => stats.negative += 1,
                Sentiment::Neutral => stats.neutral += 1,
            }
            *stats
                .by_requirement
                .entry(email.requirement.as_str().to_string())
                .or_insert(0) += 1;

            let sender = email.sender.trim();
            if !sender.is_empty() {
                *senders.entry(sender).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = senders.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats.top_senders = ranked
            .into_iter()
            .take(TOP_SENDERS)
            .map(|(sender, count)| SenderCount {
                sender: sender.to_string(),
                count,
            })
            .collect();

        stats
    }
}
