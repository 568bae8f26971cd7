use std::io;
use thiserror::Error;

/// Unified error type for sbooper
#[derive(Error, Debug)]
pub enum BooperError {
    /// Helix API returned a non-success status or rejected the request
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// A user or channel lookup came back empty
    #[error("Not found: {0}")]
    NotFound(String),

    /// A dispatch run was started while another one is still active
    #[error("A dispatch run is already in progress")]
    AlreadyRunning,

    /// The dispatch task itself failed
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Unknown or unexpected errors
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for BooperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BooperError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            BooperError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            BooperError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            BooperError::Serialization(format!("Failed to decode response: {}", err))
        } else {
            BooperError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for BooperError {
    fn from(err: serde_json::Error) -> Self {
        BooperError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for BooperError {
    fn from(err: serde_yml::Error) -> Self {
        BooperError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<rustyline::error::ReadlineError> for BooperError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        BooperError::Input(format!("Line editor error: {}", err))
    }
}

impl From<tokio::task::JoinError> for BooperError {
    fn from(err: tokio::task::JoinError) -> Self {
        BooperError::Dispatch(format!("Dispatch task did not finish: {}", err))
    }
}

impl From<String> for BooperError {
    fn from(err: String) -> Self {
        BooperError::Unknown(err)
    }
}

impl From<&str> for BooperError {
    fn from(err: &str) -> Self {
        BooperError::Unknown(err.to_string())
    }
}
