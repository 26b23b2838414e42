use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;

use super::key::SigningKey;
use crate::modules::store::UserId;

const SIGNATURE_LEN: usize = 32;

/// Why a token was refused. Callers outside this module only ever see
/// `Unauthorized`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

#[derive(Deserialize)]
struct Claims {
    sub: UserId,
    iat: u64,
    exp: u64,
}

/// Signed, time-bounded proof of a successful login.
///
/// Wire form is `base64url(claims) "." base64url(HMAC-SHA256(base64url(claims)))`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    subject_id: UserId,
    issued_at: u64,
    expires_at: u64,
    // Encoded claims exactly as signed
    claims: String,
    signature: Vec<u8>,
}

impl SessionToken {
    pub(crate) fn sign(
        subject_id: UserId,
        issued_at: u64,
        expires_at: u64,
        key: &SigningKey,
    ) -> Self {
        let payload = json!({ "sub": subject_id, "iat": issued_at, "exp": expires_at });
        let claims = URL_SAFE_NO_PAD.encode(payload.to_string());
        let signature = key.sign(claims.as_bytes());

        Self {
            subject_id,
            issued_at,
            expires_at,
            claims,
            signature,
        }
    }

    pub fn subject_id(&self) -> UserId {
        self.subject_id
    }

    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    pub(crate) fn signed_payload(&self) -> &[u8] {
        self.claims.as_bytes()
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.claims, URL_SAFE_NO_PAD.encode(&self.signature))
    }

    /// Parse the wire form. This checks shape only, never the signature.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let mut parts = raw.trim().split('.');
        let (claims, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(s), None) if !c.is_empty() && !s.is_empty() => (c, s),
            _ => return Err(TokenError::Invalid),
        };

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| TokenError::Invalid)?;
        let parsed: Claims =
            serde_json::from_slice(&claims_json).map_err(|_| TokenError::Invalid)?;
        if parsed.exp < parsed.iat {
            return Err(TokenError::Invalid);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;
        if signature.len() != SIGNATURE_LEN {
            return Err(TokenError::Invalid);
        }

        Ok(Self {
            subject_id: parsed.sub,
            issued_at: parsed.iat,
            expires_at: parsed.exp,
            claims: claims.to_string(),
            signature,
        })
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("subject_id", &self.subject_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
