//! OAuth grant errors (RFC 6749 §5.2)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Failure on `/authorize` or `/oauth/token`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// Unknown client id or wrong secret
    #[error("invalid_client")]
    InvalidClient { unauthorized: bool },

    /// Code absent, expired, already redeemed, redirect mismatch or PKCE failure
    #[error("invalid_grant: {0}")]
    InvalidGrant(&'static str),

    #[error("unsupported_grant_type")]
    UnsupportedGrantType,

    /// Malformed authorize or token request
    #[error("invalid_request: {0}")]
    InvalidRequest(&'static str),

    /// OAuth client credentials are not configured
    #[error("server_error")]
    ServerError,
}

impl OAuthError {
    /// Wire error code
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient { .. } => "invalid_client",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::ServerError => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OAuthError::InvalidClient { unauthorized: true } => StatusCode::UNAUTHORIZED,
            OAuthError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn description(&self) -> Option<&'static str> {
        match self {
            OAuthError::InvalidGrant(d) | OAuthError::InvalidRequest(d) => Some(d),
            _ => None,
        }
    }
}

/// OAuth error response body
#[derive(Debug, Serialize)]
pub struct OAuthErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<&'static str>,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = OAuthErrorBody {
            error: self.code(),
            error_description: self.description(),
        };
        (self.status(), Json(body)).into_response()
    }
}
