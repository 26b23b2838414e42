pub mod file;
pub mod memory;
pub mod record;

use std::io;
use thiserror::Error;

use crate::modules::crypto::HashParams;

// Re-export the main types
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use record::{normalize_identifier, UserId, UserRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identifier already registered")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store file is corrupt: {0}")]
    Corrupt(String),
}

/// Persistence for user records.
///
/// Identifiers are matched case-insensitively. `create` must check and insert
/// as one step so concurrent registrations of the same identifier produce a
/// single record.
pub trait CredentialStore: Send + Sync {
    fn create(
        &self,
        identifier: &str,
        password_hash: Vec<u8>,
        hash_params: HashParams,
    ) -> Result<UserRecord, StoreError>;

    fn find_by_identifier(&self, identifier: &str) -> Result<UserRecord, StoreError>;

    fn find_by_id(&self, id: UserId) -> Result<UserRecord, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
