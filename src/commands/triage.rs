//! `triage`: list inbox emails with their tags, urgent first.

use std::path::PathBuf;

use tracing::info;

use super::{load_triaged, persist, render_structured, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::triage::TriagedEmail;

pub fn run(
    config: &Config,
    inbox: Option<PathBuf>,
    all: bool,
    limit: Option<usize>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let mut emails = load_triaged(config, inbox.as_ref(), all)?;
    if let Some(limit) = limit {
        emails.truncate(limit);
    }
    info!(emails = emails.len(), filtered = !all, "Inbox triaged");

    let payload = match fmt {
        OutputFormat::Table => render_table(&emails),
        _ => render_structured(fmt, &emails)?,
    };
    println!("{payload}");

    if let Some(path) = output {
        persist(&path, &payload)?;
        println!("Saved: {}", path.display());
    }

    Ok(())
}

fn render_table(emails: &[TriagedEmail]) -> String {
    let mut out = format!("Emails: {}\n\n", emails.len());
    out.push_str(&format!(
        "{:<4} {:<8} {:<9} {:<16} {:<20} {:<30} {}\n",
        "#", "Priority", "Sentiment", "Requirement", "Sender", "Subject", "Preview"
    ));
    out.push_str(&"-".repeat(110));
    out.push('\n');

    for (idx, email) in emails.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<8} {:<9} {:<16} {:<20} {:<30} {}\n",
            idx,
            email.priority,
            email.sentiment,
            email.requirement,
            email.sender_name,
            email.subject,
            email.preview.replace('\n', " ")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::inbox::{triage_email, EmailRecord};

    #[test]
    fn table_lists_emails_with_index() {
        let email = triage_email(&EmailRecord {
            sender: "jane.roe@example.com".into(),
            subject: "Help".into(),
            body: "Urgent\nplease".into(),
            sent_date: None,
        });
        let table = render_table(&[email]);

        assert!(table.starts_with("Emails: 1"));
        assert!(table.contains("Jane Roe"));
        assert!(table.contains("Urgent please"));
        assert!(table.lines().any(|l| l.starts_with("0 ")));
    }
}
