use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::memory::UserTable;
use super::record::{UserId, UserRecord};
use super::{CredentialStore, StoreError};
use crate::modules::crypto::HashParams;
use crate::modules::utils::logging::log_data_operation;

const STORE_VERSION: u32 = 1;

#[derive(Deserialize)]
struct StoreFile {
    version: u32,
    users: Vec<UserRecord>,
}

#[derive(Serialize)]
struct StoreSnapshot<'a> {
    version: u32,
    users: Vec<&'a UserRecord>,
}

/// Credential store persisted as a JSON document.
///
/// The whole document is rewritten after every insert (temp file + rename),
/// so a crash leaves either the old or the new file, never a torn one.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    table: RwLock<UserTable>,
}

impl FileCredentialStore {
    /// Open the store at `path`. A missing file is an empty store; a file
    /// that cannot be parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let table = match fs::read(&path) {
            Ok(data) => {
                let file: StoreFile = serde_json::from_slice(&data)?;
                if file.version != STORE_VERSION {
                    return Err(StoreError::Corrupt(format!(
                        "unsupported store version {}",
                        file.version
                    )));
                }
                UserTable::from_records(file.users)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => UserTable::default(),
            Err(e) => return Err(e.into()),
        };

        log_data_operation(
            "open",
            &path.display().to_string(),
            true,
            Some(&format!("{} users loaded", table.len())),
        );

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &UserTable) -> Result<(), StoreError> {
        let snapshot = StoreSnapshot {
            version: STORE_VERSION,
            users: table.records(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)?;

        let tmp_path = temp_path(&self.path);
        // A leftover temp file would keep its own permissions
        match fs::remove_file(&tmp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        {
            let mut options = OpenOptions::new();
            options.write(true).create_new(true);
            // Hashes are one-way, but there is no reason for others to read them
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl CredentialStore for FileCredentialStore {
    fn create(
        &self,
        identifier: &str,
        password_hash: Vec<u8>,
        hash_params: HashParams,
    ) -> Result<UserRecord, StoreError> {
        let record = UserRecord::new(identifier, password_hash, hash_params);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(record.clone())?;

        // Keep memory and disk in agreement: undo the insert if the write fails
        if let Err(e) = self.persist(&table) {
            table.remove(record.id);
            log_data_operation(
                "create",
                &self.path.display().to_string(),
                false,
                Some(&e.to_string()),
            );
            return Err(e);
        }

        log_data_operation("create", &self.path.display().to_string(), true, None);
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
