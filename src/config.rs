//! Configuration for the generation service, knowledge base and embeddings
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;

/// Default constants (fallback if config.yml not found)
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KB_PATH: &str = "data/faq.txt";
pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_EMBEDDINGS_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDINGS_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LOCAL_DIMENSION: usize = 256;
pub const DEFAULT_INBOX_PATH: &str = "data/emails.csv";
pub const DEFAULT_SUPPORT_KEYWORDS: &[&str] = &["support", "query", "request", "help"];

/// Which embedder to try at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAI,
    /// Deterministic hashed embeddings, no network
    Local,
    /// Lexical retrieval only
    None,
}

impl EmbeddingBackend {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "local" | "hash" => EmbeddingBackend::Local,
            "none" | "off" | "lexical" => EmbeddingBackend::None,
            _ => EmbeddingBackend::OpenAI,
        }
    }
}

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    generation: Option<GenerationSection>,
    knowledge_base: Option<KnowledgeBaseSection>,
    embeddings: Option<EmbeddingsSection>,
    inbox: Option<InboxSection>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationSection {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeBaseSection {
    path: Option<String>,
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingsSection {
    backend: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    dimension: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct InboxSection {
    path: Option<String>,
    support_keywords: Option<Vec<String>>,
}

/// Settings of the chat-completion service used to draft replies.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub base_url: String,
    /// Empty when no credential was supplied.
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    /// Per-request bound for the remote backend. Calls are never retried.
    pub timeout: Duration,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub generation: GenerationSettings,
    pub knowledge_base_path: PathBuf,
    pub top_k: usize,
    pub embeddings: EmbeddingSettings,
    pub inbox_path: PathBuf,
    pub support_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> String {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
                if let Ok(env_val) = std::env::var(var_name) {
                    return env_val;
                }
                // Unresolved placeholder is not a usable value
                return std::env::var(env_key).unwrap_or_default();
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return env_val;
        }
        value.unwrap_or_default()
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text (env placeholders are resolved).
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: YamlConfig = if content.trim().is_empty() {
            YamlConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        Ok(Self::from_sections(yaml))
    }

    fn from_sections(yaml: YamlConfig) -> Self {
        let generation = yaml.generation.unwrap_or_default();
        let kb = yaml.knowledge_base.unwrap_or_default();
        let embeddings = yaml.embeddings.unwrap_or_default();
        let inbox = yaml.inbox.unwrap_or_default();

        let base_url = Self::resolve_env_string(generation.base_url, "GENERATION_BASE_URL");
        let embeddings_base_url =
            Self::resolve_env_string(embeddings.base_url, "EMBEDDINGS_BASE_URL");

        Self {
            generation: GenerationSettings {
                base_url: non_empty_or(base_url, DEFAULT_BASE_URL),
                api_key: Self::resolve_env_string(generation.api_key, "GROQ_API_KEY"),
                model: generation
                    .model
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(
                    generation.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1),
                ),
                temperature: generation.temperature,
                max_tokens: generation.max_tokens,
            },
            knowledge_base_path: PathBuf::from(kb.path.unwrap_or_else(|| DEFAULT_KB_PATH.into())),
            top_k: kb.top_k.unwrap_or(DEFAULT_TOP_K).max(1),
            embeddings: EmbeddingSettings {
                backend: embeddings
                    .backend
                    .as_deref()
                    .map(EmbeddingBackend::parse)
                    .unwrap_or(EmbeddingBackend::OpenAI),
                base_url: non_empty_or(embeddings_base_url, DEFAULT_EMBEDDINGS_BASE_URL),
                api_key: Self::resolve_env_string(embeddings.api_key, "OPENAI_API_KEY"),
                model: embeddings
                    .model
                    .unwrap_or_else(|| DEFAULT_EMBEDDINGS_MODEL.to_string()),
                dimension: embeddings.dimension.unwrap_or(DEFAULT_LOCAL_DIMENSION),
                timeout: Duration::from_secs(
                    embeddings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1),
                ),
            },
            inbox_path: PathBuf::from(inbox.path.unwrap_or_else(|| DEFAULT_INBOX_PATH.into())),
            support_keywords: inbox.support_keywords.unwrap_or_else(|| {
                DEFAULT_SUPPORT_KEYWORDS
                    .iter()
                    .map(|k| k.to_string())
                    .collect()
            }),
        }
    }

    /// Create config with defaults, credentials taken from the environment.
    pub fn defaults() -> Self {
        Self::from_sections(YamlConfig::default())
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
