//! Error types for fcast
//!
//! Guard rejections are not errors; they come back as
//! [`GuardOutcome::Reject`](crate::guards::GuardOutcome). The types here cover
//! configuration, local persistence, signing, and hub communication.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FcastError>;

#[derive(Error, Debug)]
pub enum FcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FcastError::InvalidInput(_) => 3,
            FcastError::Hub(HubError::Signer(_)) => 2,
            FcastError::Config(ConfigError::MissingField(_)) => 2,
            FcastError::Hub(_) => 1,
            FcastError::Config(_) => 1,
            FcastError::State(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failures writing the state file.
///
/// Reads never fail: an unreadable or corrupt file is replaced by an empty
/// state when loading.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum HubError {
    #[error("Signer error: {0}")]
    Signer(String),

    #[error("{path}: {status} {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            HubError::Decode(e.to_string())
        } else {
            HubError::Network(e.to_string())
        }
    }
}
