//! Bearer tokens and the claims carried in them.
//!
//! Tokens are `header.payload.signature`, each segment base64url. Only the
//! payload is read, and only for presentation decisions: the signature is not
//! checked and nothing here is an authorization decision. The server enforces
//! access on every call.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::error::ClientError;

/// Identity attributes decoded from a token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Admin flag embedded at issuance.
    pub is_admin: bool,
}

/// An opaque bearer credential.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the payload segment.
    pub fn claims(&self) -> Result<Claims, ClientError> {
        decode_claims(&self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Decode the claims of a raw token.
///
/// Padding on the payload segment is tolerated.
pub fn decode_claims(token: &str) -> Result<Claims, ClientError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(ClientError::InvalidToken {
            reason: format!("expected 3 segments, found {}", segments.len()),
        });
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken { reason: format!("payload encoding: {e}") })?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidToken { reason: format!("payload claims: {e}") })
}
