use argon2::{Algorithm, Argon2, Params, Version};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::{constant_time_eq, derive_key_from_passphrase, generate_random_salt};
use crate::HASH_LEN;

pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 100_000;

// Upper bounds on cost. Stored records are read back from disk, and an
// unbounded cost there would stall or abort every login.
pub const MAX_ARGON2_MEMORY_KIB: u32 = 1_048_576;
pub const MAX_ARGON2_ITERATIONS: u32 = 64;
pub const MAX_ARGON2_PARALLELISM: u32 = 16;
pub const MAX_PBKDF2_ROUNDS: u32 = 10_000_000;

const MIN_SALT_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Which algorithm new hashes are produced with, and at what cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Argon2id {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
    Pbkdf2Sha256 {
        rounds: u32,
    },
}

impl HashAlgorithm {
    /// Reject zero or out-of-range cost settings
    pub fn check_cost(&self) -> Result<(), HashError> {
        match *self {
            HashAlgorithm::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                if memory_kib == 0 || memory_kib > MAX_ARGON2_MEMORY_KIB {
                    return Err(HashError::InvalidParams(format!(
                        "memory_kib must be between 1 and {}",
                        MAX_ARGON2_MEMORY_KIB
                    )));
                }
                if iterations == 0 || iterations > MAX_ARGON2_ITERATIONS {
                    return Err(HashError::InvalidParams(format!(
                        "iterations must be between 1 and {}",
                        MAX_ARGON2_ITERATIONS
                    )));
                }
                if parallelism == 0 || parallelism > MAX_ARGON2_PARALLELISM {
                    return Err(HashError::InvalidParams(format!(
                        "parallelism must be between 1 and {}",
                        MAX_ARGON2_PARALLELISM
                    )));
                }
            }
            HashAlgorithm::Pbkdf2Sha256 { rounds } => {
                if rounds == 0 || rounds > MAX_PBKDF2_ROUNDS {
                    return Err(HashError::InvalidParams(format!(
                        "rounds must be between 1 and {}",
                        MAX_PBKDF2_ROUNDS
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Argon2id {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

/// Everything needed to recompute a stored hash. Kept next to the hash so
/// records created under older cost settings still verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum HashParams {
    Argon2id {
        #[serde(with = "crate::modules::crypto::hex_bytes")]
        salt: Vec<u8>,
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
    Pbkdf2Sha256 {
        #[serde(with = "crate::modules::crypto::hex_bytes")]
        salt: Vec<u8>,
        rounds: u32,
    },
}

impl HashParams {
    pub fn salt(&self) -> &[u8] {
        match self {
            HashParams::Argon2id { salt, .. } | HashParams::Pbkdf2Sha256 { salt, .. } => salt,
        }
    }

    /// The algorithm and cost these params were produced with
    pub fn algorithm(&self) -> HashAlgorithm {
        match *self {
            HashParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
                ..
            } => HashAlgorithm::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            },
            HashParams::Pbkdf2Sha256 { rounds, .. } => HashAlgorithm::Pbkdf2Sha256 { rounds },
        }
    }
}

/// Salted, deliberately slow one-way password hashing
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
}

impl PasswordHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Hash `plaintext` under a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<(Vec<u8>, HashParams), HashError> {
        let salt = generate_random_salt();
        let params = match self.algorithm {
            HashAlgorithm::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => HashParams::Argon2id {
                salt,
                memory_kib,
                iterations,
                parallelism,
            },
            HashAlgorithm::Pbkdf2Sha256 { rounds } => HashParams::Pbkdf2Sha256 { salt, rounds },
        };

        let hash = derive(plaintext, &params)?;
        Ok((hash, params))
    }

    /// Check `plaintext` against a stored hash. Malformed input is a mismatch.
    pub fn verify(&self, plaintext: &str, hash: &[u8], params: &HashParams) -> bool {
        if hash.len() != HASH_LEN {
            return false;
        }
        match derive(plaintext, params) {
            Ok(candidate) => constant_time_eq(&candidate, hash),
            Err(e) => {
                debug!("Rejecting stored hash: {}", e);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(HashAlgorithm::Argon2id {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
    }
}

fn derive(plaintext: &str, params: &HashParams) -> Result<Vec<u8>, HashError> {
    if params.salt().len() < MIN_SALT_LEN {
        return Err(HashError::InvalidParams("salt too short".to_string()));
    }
    params.algorithm().check_cost()?;

    let mut output = vec![0u8; HASH_LEN];
    match params {
        HashParams::Argon2id {
            salt,
            memory_kib,
            iterations,
            parallelism,
        } => {
            let argon_params = Params::new(*memory_kib, *iterations, *parallelism, Some(HASH_LEN))
                .map_err(|e| HashError::InvalidParams(e.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(plaintext.as_bytes(), salt, &mut output)
                .map_err(|e| HashError::Derivation(e.to_string()))?;
        }
        HashParams::Pbkdf2Sha256 { salt, rounds } => {
            output = derive_key_from_passphrase(plaintext, salt, *rounds);
        }
    }
    Ok(output)
}
