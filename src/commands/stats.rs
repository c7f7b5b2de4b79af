//! `stats`: inbox summary numbers.

use std::path::PathBuf;

use chrono::Utc;

use super::{load_triaged, render_structured, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::triage::InboxStats;

pub fn run(config: &Config, inbox: Option<PathBuf>, all: bool, format: &str) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let emails = load_triaged(config, inbox.as_ref(), all)?;
    let stats = InboxStats::compute(&emails, Utc::now());

    let payload = match fmt {
        OutputFormat::Table => render_table(&stats),
        _ => render_structured(fmt, &stats)?,
    };
    println!("{payload}");
    Ok(())
}

fn render_table(stats: &InboxStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total emails:      {}\n", stats.total));
    out.push_str(&format!("Last 24 hours:     {}\n", stats.last_24h));
    out.push_str(&format!(
        "Priority:          urgent {} / high {} / normal {}\n",
        stats.urgent, stats.high, stats.normal
    ));
    out.push_str(&format!(
        "Sentiment:         positive {} / negative {} / neutral {}\n",
        stats.positive, stats.negative, stats.neutral
    ));

    out.push_str("\nRequirements:\n");
    for (requirement, count) in &stats.by_requirement {
        out.push_str(&format!("  {:<18} {}\n", requirement, count));
    }

    out.push_str("\nTop senders:\n");
    for sender in &stats.top_senders {
        out.push_str(&format!("  {:<30} {}\n", sender.sender, sender.count));
    }

    out.push_str("\nLast 7 days:\n");
    for (day, count) in &stats.last_7_days {
        out.push_str(&format!("  {}  {}\n", day.format("%Y-%m-%d"), count));
    }

    out
}
