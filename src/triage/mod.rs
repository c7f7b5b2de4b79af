//! Inbox triage: tagging, contact extraction and summary stats.

pub mod classify;
pub mod contacts;
pub mod inbox;
pub mod stats;

pub use classify::{Priority, Requirement, Sentiment};
pub use inbox::{load_inbox, read_inbox, triage_inbox, EmailRecord, TriagedEmail};
pub use stats::InboxStats;
