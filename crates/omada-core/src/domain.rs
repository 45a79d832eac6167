//! Omada Open API wire types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{OmadaError, OmadaResult};

/// Seconds shaved off the server-reported lifetime before a token is considered expired
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Response wrapper used by every Omada endpoint
///
/// `errorCode == 0` is the only success signal; HTTP status is not consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub error_code: i64,
    #[serde(default)]
    pub msg: String,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Check the error code and hand back the payload
    pub fn into_result(self) -> OmadaResult<Option<T>> {
        if self.error_code != 0 {
            return Err(OmadaError::Api {
                code: self.error_code,
                msg: self.msg,
            });
        }
        Ok(self.result)
    }
}

/// Result of `GET /api/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerInfo {
    pub omadac_id: String,
    #[serde(default)]
    pub controller_ver: String,
    #[serde(default)]
    pub api_ver: String,
    #[serde(default)]
    pub configured: bool,
    #[serde(default, rename = "type")]
    pub controller_type: i64,
    #[serde(default)]
    pub support_app: bool,
}

/// Result of the client-credentials token call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: i64,
}

/// Cached upstream access token
#[derive(Clone)]
pub struct AccessToken {
    value: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
            expires_at,
        }
    }

    /// Build from a grant, applying the safety margin
    ///
    /// A lifetime that does not fit the clock is a malformed grant, not a panic.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> OmadaResult<Self> {
        let expires_at = Duration::try_seconds(
            grant.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS),
        )
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            OmadaError::Authentication(format!(
                "token lifetime out of range: expiresIn={}",
                grant.expires_in
            ))
        })?;
        Ok(Self::new(grant.access_token, expires_at))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("AccessToken {}", self.value.as_str())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
