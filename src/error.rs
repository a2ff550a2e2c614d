//! Error types for Husk.

use thiserror::Error;

/// Library-level error type for Husk operations.
#[derive(Error, Debug)]
pub enum HuskError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote dependency was unreachable or answered with a non-success status.
    #[error("{provider} request failed{}: {message}", status_suffix(.status))]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl HuskError {
    /// Build a provider error for a non-success HTTP response.
    pub fn provider_status(provider: &str, status: u16, body: impl Into<String>) -> Self {
        HuskError::Provider {
            provider: provider.to_string(),
            status: Some(status),
            message: body.into(),
        }
    }

    /// Build a provider error that carries no HTTP status.
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        HuskError::Provider {
            provider: provider.to_string(),
            status: None,
            message: message.into(),
        }
    }

    /// Classify a reqwest transport failure.
    pub fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HuskError::Timeout(format!("{} request: {}", provider, err))
        } else if err.is_decode() {
            HuskError::provider(provider, format!("undecodable response: {}", err))
        } else {
            HuskError::provider(provider, err.to_string())
        }
    }
}

/// Result type alias for Husk operations.
pub type Result<T> = std::result::Result<T, HuskError>;
