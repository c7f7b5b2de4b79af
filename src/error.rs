//! Error types for the mail assistant

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid credential / client setup. Detected once at
    /// construction, reported on every call that needs the client.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Transport, auth, malformed response or timeout of the generation service.
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Stable short label, used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::EmbeddingUnavailable(_) => "embedding_unavailable",
            Error::Generation(_) => "generation",
            Error::Cancelled => "cancelled",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Csv(_) => "csv",
            Error::InvalidArgument(_) => "invalid_argument",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}
