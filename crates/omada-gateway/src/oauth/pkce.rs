//! PKCE (Proof Key for Code Exchange)
//!
//! Server side of RFC 7636: the challenge is stored with the authorization code and the
//! verifier is checked when the code is redeemed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

/// Transformation applied to the verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PkceMethod {
    #[default]
    S256,
    Plain,
}

impl PkceMethod {
    /// Parse `code_challenge_method`; absent means S256
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            None | Some("S256") => Some(PkceMethod::S256),
            Some("plain") => Some(PkceMethod::Plain),
            Some(_) => None,
        }
    }
}

/// Challenge recorded at authorize time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub challenge: String,
    pub method: PkceMethod,
}

impl PkceChallenge {
    pub fn new(challenge: impl Into<String>, method: PkceMethod) -> Self {
        Self {
            challenge: challenge.into(),
            method,
        }
    }

    /// Check a verifier presented at the token endpoint
    pub fn verify(&self, verifier: &str) -> bool {
        match self.method {
            PkceMethod::S256 => s256_challenge(verifier) == self.challenge,
            PkceMethod::Plain => verifier == self.challenge,
        }
    }
}

/// BASE64URL(SHA256(verifier)) without padding
pub fn s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
