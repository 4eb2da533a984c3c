//! Error types for the AgentBay SDK.
//!
//! Public operations report API-level failures through result envelopes
//! (see [`crate::response`]); the variants here surface only conditions the
//! caller cannot recover from by inspecting an envelope: missing credentials
//! at construction, transport breakage, programming errors, and the
//! clearance timeout.

use thiserror::Error;

/// Result type alias using AgentBayError.
pub type Result<T> = std::result::Result<T, AgentBayError>;

/// Errors that can occur when using the AgentBay SDK.
#[derive(Debug, Error)]
pub enum AgentBayError {
    /// Missing or invalid API key, or unusable client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or HTTP error.
    ///
    /// The string contains the source error's display output, preserving
    /// error chain information without leaking `reqwest` types.
    #[error("network error: {0}")]
    Network(String),

    /// The control plane answered with a non-2xx status.
    #[error("http status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input detected before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Session operation failed in a way the envelope cannot express.
    #[error("session error: {0}")]
    Session(String),

    /// A context clear did not reach `available` within its poll budget.
    #[error("context clearance timed out: {0}")]
    ClearanceTimeout(String),
}

impl AgentBayError {
    /// Check if this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AgentBayError::Network(_) | AgentBayError::HttpStatus { .. }
        )
    }
}

impl From<reqwest::Error> for AgentBayError {
    fn from(err: reqwest::Error) -> Self {
        AgentBayError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AgentBayError {
    fn from(err: serde_json::Error) -> Self {
        AgentBayError::Parse(err.to_string())
    }
}

#[cfg(test)]
#[path = "error.test.rs"]
mod tests;
