use thiserror::Error;

use crate::provider::Provider;

/// Why a request to the remote analyst failed.
///
/// Every variant surfaces to the user the same way (the apology message);
/// the variants only exist so the log can tell them apart.
#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error (status {status}): {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0} returned no content")]
    EmptyResponse(&'static str),

    #[error("Malformed analyst response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Analyst task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown provider '{0}' (expected gemini, openai, claude or ollama)")]
    UnknownProvider(String),

    #[error("No API key for {}. Set {} or add it to the config file", .0.display_name(), .0.key_env_var().unwrap_or("an API key"))]
    MissingApiKey(Provider),
}
