//! Chat-completion client for OpenAI-compatible services (Groq, OpenAI, ...).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GenerationSettings;
use crate::{Error, Result};

/// Sends a rendered prompt as a single user message and returns the reply.
///
/// Construction never fails: a missing credential or an HTTP client that
/// cannot be built is remembered and reported by every [`ReplyClient::complete`].
#[derive(Debug, Clone)]
pub struct ReplyClient {
    state: ClientState,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: u64,
}

#[derive(Debug, Clone)]
enum ClientState {
    Ready { http: Client, api_key: String },
    Misconfigured(String),
}

impl ReplyClient {
    pub fn new(settings: &GenerationSettings) -> Self {
        let state = if settings.api_key.trim().is_empty() {
            let reason = "API key for the generation service is not set (GROQ_API_KEY)".to_string();
            warn!("{reason}; reply generation will fail until it is configured");
            ClientState::Misconfigured(reason)
        } else {
            match Client::builder()
                .user_agent(concat!("mail_assistant/", env!("CARGO_PKG_VERSION")))
                .timeout(settings.timeout)
                .build()
            {
                Ok(http) => ClientState::Ready {
                    http,
                    api_key: settings.api_key.clone(),
                },
                Err(e) => {
                    let reason = format!("HTTP client error: {}", e);
                    warn!("{reason}");
                    ClientState::Misconfigured(reason)
                }
            }
        };

        Self {
            state,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_secs: settings.timeout.as_secs(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, ClientState::Ready { .. })
    }

    /// One chat completion: a single user message carrying `prompt`.
    /// Returns the first choice's content, trimmed.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let (http, api_key) = match &self.state {
            ClientState::Ready { http, api_key } => (http, api_key),
            ClientState::Misconfigured(reason) => {
                return Err(Error::Configuration(reason.clone()))
            }
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending chat completion");

        let response = http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(Error::Generation(format!(
                "service error {}: {}",
                status, text
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Generation(format!("Invalid response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::Generation("Empty response from model".to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Generation(format!("request timed out after {}s", self.timeout_secs))
        } else {
            Error::Generation(format!("request failed: {}", err))
        }
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
