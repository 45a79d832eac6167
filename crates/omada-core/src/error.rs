//! Error types
//!
//! `OmadaError` covers every failure an upstream call can produce. Each variant maps to one
//! entry of the bridge's error taxonomy so callers can tell a rejected credential from an
//! envelope-level failure or a hung controller.

use std::time::Duration;

/// Result alias for upstream operations
pub type OmadaResult<T> = Result<T, OmadaError>;

/// Failure reaching or talking to the Omada controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OmadaError {
    /// The controller identifier could not be resolved
    #[error("Failed to get controller info: {0}")]
    Discovery(String),

    /// Client-credential token issuance was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The envelope carried a nonzero `errorCode`
    #[error("Omada API error: {msg} (code: {code})")]
    Api { code: i64, msg: String },

    /// Network or HTTP-layer failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The outbound call exceeded its deadline
    #[error("Request to Omada controller timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The body was not a valid envelope
    #[error("Unexpected response from Omada controller: {0}")]
    Decode(String),

    /// The request could not be built (bad identifier, bad base URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OmadaError {
    /// Envelope error code, if this is an application-level failure
    pub fn api_code(&self) -> Option<i64> {
        match self {
            OmadaError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Wrap a failure hit while resolving the controller identifier.
    ///
    /// Timeouts keep their own variant.
    pub(crate) fn into_discovery(self) -> Self {
        match self {
            OmadaError::Timeout(_) | OmadaError::Discovery(_) => self,
            OmadaError::Api { msg, .. } => OmadaError::Discovery(msg),
            other => OmadaError::Discovery(other.to_string()),
        }
    }
}

/// Startup configuration failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
