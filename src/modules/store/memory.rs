use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::record::{normalize_identifier, UserId, UserRecord};
use super::{CredentialStore, StoreError};
use crate::modules::crypto::HashParams;

/// Records keyed by normalized identifier, with an id index beside them
#[derive(Debug, Default)]
pub(crate) struct UserTable {
    by_identifier: HashMap<String, UserRecord>,
    by_id: HashMap<UserId, String>,
}

impl UserTable {
    pub(crate) fn from_records(records: Vec<UserRecord>) -> Result<Self, StoreError> {
        let mut table = Self::default();
        for record in records {
            if record.identifier_normalized != normalize_identifier(&record.identifier) {
                return Err(StoreError::Corrupt(format!(
                    "normalized identifier mismatch for {:?}",
                    record.identifier
                )));
            }
            let key = record.identifier_normalized.clone();
            table.insert(record).map_err(|_| {
                StoreError::Corrupt(format!("duplicate identifier {:?}", key))
            })?;
        }
        Ok(table)
    }

    pub(crate) fn insert(&mut self, record: UserRecord) -> Result<(), StoreError> {
        if self.by_id.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        match self.by_identifier.entry(record.identifier_normalized.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                self.by_id.insert(record.id, record.identifier_normalized.clone());
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, id: UserId) -> Option<UserRecord> {
        let key = self.by_id.remove(&id)?;
        self.by_identifier.remove(&key)
    }

    pub(crate) fn get_by_identifier(&self, identifier: &str) -> Option<&UserRecord> {
        self.by_identifier.get(&normalize_identifier(identifier))
    }

    pub(crate) fn get_by_id(&self, id: UserId) -> Option<&UserRecord> {
        self.by_id
            .get(&id)
            .and_then(|key| self.by_identifier.get(key))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_identifier.len()
    }

    /// Records sorted by creation time, for stable on-disk output
    pub(crate) fn records(&self) -> Vec<&UserRecord> {
        let mut records: Vec<&UserRecord> = self.by_identifier.values().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identifier_normalized.cmp(&b.identifier_normalized))
        });
        records
    }
}

/// Credential store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    table: RwLock<UserTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn create(
        &self,
        identifier: &str,
        password_hash: Vec<u8>,
        hash_params: HashParams,
    ) -> Result<UserRecord, StoreError> {
        let record = UserRecord::new(identifier, password_hash, hash_params);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(record.clone())?;
        Ok(record)
    }

    fn find_by_identifier(&self, identifier: &str) -> Result<UserRecord, StoreError> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .get_by_identifier(identifier)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn find_by_id(&self, id: UserId) -> Result<UserRecord, StoreError> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get_by_id(id).cloned().ok_or(StoreError::NotFound)
    }

    fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
