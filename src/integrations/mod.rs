//! External integrations module.
//!
//! Provides clients for:
//! - OpenAI-compatible chat completions (Groq by default)

pub mod openai;

pub use openai::ReplyClient;
