use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::modules::crypto::HashParams;
use crate::modules::utils::time::get_current_timestamp;

/// Opaque unique identifier of a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lowercase, trimmed form used for lookups and uniqueness
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Represents a single user with their credential material
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub identifier: String,            // As entered by the user (for display)
    pub identifier_normalized: String, // Lowercase version for lookups and comparisons
    #[serde(with = "crate::modules::crypto::hex_bytes")]
    pub password_hash: Vec<u8>,
    pub hash_params: HashParams,
    pub created_at: u64,
}

impl UserRecord {
    pub fn new(identifier: &str, password_hash: Vec<u8>, hash_params: HashParams) -> Self {
        let identifier = identifier.trim().to_string();
        let identifier_normalized = normalize_identifier(&identifier);
        Self {
            id: UserId::generate(),
            identifier,
            identifier_normalized,
            password_hash,
            hash_params,
            created_at: get_current_timestamp(),
        }
    }
}

// Never print the hash, not even in debug logs
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
