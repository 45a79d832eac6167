//! In-memory authorization codes and bearer tokens
//!
//! Expiry is checked on every lookup, so an expired entry behaves as absent even before the
//! sweeper removes it. Timestamps use the tokio clock.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::error::OAuthError;
use super::pkce::PkceChallenge;

/// Lifetime of an authorization code
pub const CODE_TTL: Duration = Duration::from_secs(5 * 60);

/// Lifetime of an issued bearer token
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Pending authorization code
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub redirect_uri: String,
    pub pkce: Option<PkceChallenge>,
    pub expires_at: Instant,
}

/// Freshly minted bearer token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// Counts removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub codes: usize,
    pub tokens: usize,
}

/// Code and token store shared by the OAuth endpoints and the `/mcp` gate
pub struct OAuthStore {
    codes: DashMap<String, AuthCode>,
    tokens: DashMap<String, Instant>,
    code_ttl: Duration,
    token_ttl: Duration,
}

impl Default for OAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthStore {
    pub fn new() -> Self {
        Self::with_ttls(CODE_TTL, TOKEN_TTL)
    }

    pub fn with_ttls(code_ttl: Duration, token_ttl: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            tokens: DashMap::new(),
            code_ttl,
            token_ttl,
        }
    }

    /// Mint a single-use code bound to `redirect_uri`
    pub fn issue_code(&self, redirect_uri: &str, pkce: Option<PkceChallenge>) -> String {
        let code = Uuid::new_v4().to_string();
        self.codes.insert(
            code.clone(),
            AuthCode {
                redirect_uri: redirect_uri.to_string(),
                pkce,
                expires_at: Instant::now() + self.code_ttl,
            },
        );
        code
    }

    /// Consume a code
    ///
    /// The code is removed only when it is unexpired and the redirect URI matches. A stored
    /// PKCE challenge must then be satisfied by `code_verifier`.
    pub fn redeem_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<(), OAuthError> {
        let now = Instant::now();
        let (_, entry) = self
            .codes
            .remove_if(code, |_, c| {
                now < c.expires_at && redirect_uri == Some(c.redirect_uri.as_str())
            })
            .ok_or(OAuthError::InvalidGrant(
                "authorization code is invalid, expired or bound to another redirect URI",
            ))?;

        if let Some(pkce) = entry.pkce {
            let verified = code_verifier.is_some_and(|v| pkce.verify(v));
            if !verified {
                return Err(OAuthError::InvalidGrant("PKCE verification failed"));
            }
        }
        Ok(())
    }

    /// Mint a bearer token
    pub fn issue_token(&self) -> IssuedToken {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .insert(token.clone(), Instant::now() + self.token_ttl);
        IssuedToken {
            access_token: token,
            expires_in: self.token_ttl.as_secs(),
        }
    }

    /// Token is known and unexpired
    pub fn is_token_active(&self, token: &str) -> bool {
        self.tokens
            .get(token)
            .is_some_and(|expiry| Instant::now() < *expiry)
    }

    /// Remove every expired code and token
    pub fn sweep_expired(&self) -> SweepStats {
        let now = Instant::now();
        let codes_before = self.codes.len();
        let tokens_before = self.tokens.len();

        self.codes.retain(|_, c| now < c.expires_at);
        self.tokens.retain(|_, expiry| now < *expiry);

        let stats = SweepStats {
            codes: codes_before.saturating_sub(self.codes.len()),
            tokens: tokens_before.saturating_sub(self.tokens.len()),
        };
        if stats != SweepStats::default() {
            debug!(codes = stats.codes, tokens = stats.tokens, "Swept expired OAuth entries");
        }
        stats
    }

    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}
