//! Common error types for CropAI

use thiserror::Error;

/// Common result type for CropAI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CropAI crates
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to a remote service (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Message suitable for showing to the user who triggered the call.
    ///
    /// Service errors carry the provider's own text (auth failures rely on
    /// this); everything else falls back to the Display form.
    pub fn user_message(&self) -> String {
        match self {
            Error::Service { message, .. } => message.clone(),
            Error::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
