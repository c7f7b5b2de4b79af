//! Static knowledge base: one snippet per non-empty line of a text file.

use std::path::Path;

use tracing::{debug, info};

use crate::Result;

/// Ordered, immutable list of corpus snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    entries: Vec<String>,
}

impl KnowledgeBase {
    /// Load snippets from `path`. A missing file yields an empty knowledge base.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Knowledge base not found, continuing without context");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let kb = Self::from_text(&content);
        debug!(path = %path.display(), entries = kb.len(), "Knowledge base loaded");
        Ok(kb)
    }

    /// Build from in-memory text, same rules as [`KnowledgeBase::load`].
    pub fn from_text(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.into().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
