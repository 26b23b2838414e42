use std::sync::Arc;
use std::time::Duration;

use super::key::SigningKey;
use super::token::{SessionToken, TokenError};
use crate::modules::store::UserId;
use crate::modules::utils::time::{Clock, SystemClock};

/// Issues and verifies stateless session tokens.
///
/// Holds only the read-only signing key, so a single instance can be shared
/// across threads. There is no revocation: a token stays valid until it
/// expires.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, ttl: Duration) -> Self {
        Self::with_clock(key, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(key: SigningKey, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { key, ttl, clock }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject_id: UserId) -> SessionToken {
        let issued_at = self.clock.now();
        let expires_at = issued_at.saturating_add(self.ttl.as_secs());
        SessionToken::sign(subject_id, issued_at, expires_at, &self.key)
    }

    /// Signature first, then expiry: a forged token is `Invalid` even when
    /// its claimed expiry has passed.
    pub fn verify(&self, token: &SessionToken) -> Result<UserId, TokenError> {
        if !self.key.verify(token.signed_payload(), token.signature()) {
            return Err(TokenError::Invalid);
        }
        if token.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }
        Ok(token.subject_id())
    }

    /// Verify a token in its wire form, e.g. taken from a bearer header
    pub fn verify_encoded(&self, raw: &str) -> Result<UserId, TokenError> {
        let token = SessionToken::decode(raw)?;
        self.verify(&token)
    }
}
