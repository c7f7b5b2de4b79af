//! Command implementations
//!
//! Each module corresponds to a subcommand of the `mail_assistant` CLI.

pub mod draft_all;
pub mod reply;
pub mod retrieve;
pub mod stats;
pub mod triage;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::triage::{load_inbox, triage_inbox, TriagedEmail};

pub use draft_all::{run as draft_all_run, DraftAllConfig};
pub use reply::{run as reply_run, ReplyArgs};
pub use retrieve::run as retrieve_run;
pub use stats::run as stats_run;
pub use triage::run as triage_run;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::InvalidArgument(format!(
                "Unsupported format '{}'. Use table|json|yaml",
                other
            ))),
        }
    }
}

/// Render `value` as JSON or YAML. Table output is command specific.
pub(crate) fn render_structured<T: Serialize + ?Sized>(
    fmt: OutputFormat,
    value: &T,
) -> Result<String> {
    match fmt {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Json | OutputFormat::Table => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub(crate) fn persist(path: &Path, payload: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, payload)?;
    Ok(())
}

/// Load and triage the inbox. Non-support mail is dropped unless `all`.
pub(crate) fn load_triaged(
    config: &Config,
    inbox: Option<&PathBuf>,
    all: bool,
) -> Result<Vec<TriagedEmail>> {
    let path = inbox.unwrap_or(&config.inbox_path);
    let records = load_inbox(path)?;
    let keywords = (!all).then_some(config.support_keywords.as_slice());
    Ok(triage_inbox(&records, keywords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("table").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("yml").unwrap(), OutputFormat::Yaml);
        assert!(OutputFormat::parse("xml").is_err());
    }

    #[test]
    fn persist_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/replies.json");
        persist(&path, "[]").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn load_triaged_applies_support_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.csv");
        fs::write(
            &path,
            "sender,subject,body,sent_date\n\
             a@x.io,Help needed,hi,2024-01-01 00:00:00\n\
             b@x.io,Lunch,hi,2024-01-01 00:00:00\n",
        )
        .unwrap();

        let config = Config::defaults();
        assert_eq!(load_triaged(&config, Some(&path), false).unwrap().len(), 1);
        assert_eq!(load_triaged(&config, Some(&path), true).unwrap().len(), 2);
    }
}
