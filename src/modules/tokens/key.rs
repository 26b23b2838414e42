use hmac::Mac;
use std::fmt;
use thiserror::Error;

use crate::modules::crypto::generate_signing_key;
use crate::{HmacSha256, SIGNING_KEY_LEN};

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("signing key must be at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },
    #[error("signing key is not valid hex: {0}")]
    NotHex(#[from] hex::FromHexError),
    #[error("signing key was rejected by the MAC")]
    Unusable,
}

/// Process-wide token signing key.
///
/// Created once at startup and handed to the [`TokenIssuer`](super::TokenIssuer)
/// explicitly. The raw bytes are not kept around after the MAC is keyed.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() < SIGNING_KEY_LEN {
            return Err(KeyError::TooShort {
                min: SIGNING_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mac = HmacSha256::new_from_slice(bytes).map_err(|_| KeyError::Unusable)?;
        Ok(Self { mac })
    }

    /// Parse a hex-encoded key, as found in configuration
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(encoded.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Fresh random key. Tokens signed with it die with the process.
    pub fn generate() -> Result<Self, KeyError> {
        Self::from_bytes(&generate_signing_key())
    }

    pub(crate) fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time signature check
    pub(crate) fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
