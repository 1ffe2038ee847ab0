//! Error handling and custom error types
//!
//! Provides unified error handling across the proxy and the client controller
//! using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client-supplied data is malformed.
    #[error("{0}")]
    Validation(String),

    /// Server misconfiguration, e.g. the upstream credential is absent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream AI service rejected or failed the request.
    #[error("Upstream service error (status {status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        detail: Option<serde_json::Value>,
    },

    /// The proxy answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Proxy { status: u16, message: String },

    /// The upstream AI service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A success response did not carry the generated text.
    #[error("Could not extract text from the API response: {0}")]
    ResponseShape(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl Error {
    /// Builds a transport error from a reqwest failure with any URL stripped.
    pub fn transport(err: reqwest::Error) -> Self {
        Error::Transport(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
