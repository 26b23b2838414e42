use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::modules::auth::{AuthService, PasswordPolicy};
use crate::modules::crypto::hasher::{
    DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
    DEFAULT_PBKDF2_ROUNDS,
};
use crate::modules::crypto::{HashAlgorithm, HashError, PasswordHasher};
use crate::modules::store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError,
};
use crate::modules::tokens::{KeyError, SigningKey, TokenIssuer};
use crate::{DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL, MIN_TOKEN_TTL};

pub const ENV_TOKEN_TTL: &str = "SOLO_AUTH_TOKEN_TTL";
pub const ENV_SIGNING_KEY: &str = "SOLO_AUTH_SIGNING_KEY";
pub const ENV_STORE_PATH: &str = "SOLO_AUTH_STORE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("failed to open credential store: {0}")]
    Store(#[from] StoreError),
    #[error("password hasher unusable: {0}")]
    Hash(#[from] HashError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmKind {
    Argon2id,
    Pbkdf2,
}

/// Cost settings for newly created password hashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    pub algorithm: HashAlgorithmKind,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub pbkdf2_rounds: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithmKind::Argon2id,
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
            pbkdf2_rounds: DEFAULT_PBKDF2_ROUNDS,
        }
    }
}

impl HashConfig {
    pub fn to_algorithm(&self) -> HashAlgorithm {
        match self.algorithm {
            HashAlgorithmKind::Argon2id => HashAlgorithm::Argon2id {
                memory_kib: self.memory_kib,
                iterations: self.iterations,
                parallelism: self.parallelism,
            },
            HashAlgorithmKind::Pbkdf2 => HashAlgorithm::Pbkdf2Sha256 {
                rounds: self.pbkdf2_rounds,
            },
        }
    }
}

/// Startup configuration for the authentication service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_ttl_secs: u64,
    pub signing_key_hex: Option<String>,
    pub store_path: Option<PathBuf>,
    pub hash: HashConfig,
    pub password_policy: PasswordPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: DEFAULT_TOKEN_TTL,
            signing_key_hex: None,
            store_path: None,
            hash: HashConfig::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "signing_key_hex",
                &self.signing_key_hex.as_ref().map(|_| "<redacted>"),
            )
            .field("store_path", &self.store_path)
            .field("hash", &self.hash)
            .field("password_policy", &self.password_policy)
            .finish()
    }
}

impl AuthConfig {
    /// Defaults, then the JSON file (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ttl) = lookup(ENV_TOKEN_TTL) {
            self.token_ttl_secs = ttl.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be a number of seconds", ENV_TOKEN_TTL))
            })?;
        }
        if let Some(key) = lookup(ENV_SIGNING_KEY) {
            self.signing_key_hex = Some(key);
        }
        if let Some(store) = lookup(ENV_STORE_PATH) {
            self.store_path = Some(PathBuf::from(store));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TOKEN_TTL..=MAX_TOKEN_TTL).contains(&self.token_ttl_secs) {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_secs must be between {} and {}",
                MIN_TOKEN_TTL, MAX_TOKEN_TTL
            )));
        }
        if let Some(key) = &self.signing_key_hex {
            SigningKey::from_hex(key)?;
        }
        self.hash
            .to_algorithm()
            .check_cost()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let policy = &self.password_policy;
        if policy.min_length == 0 || policy.min_length > policy.max_length {
            return Err(ConfigError::Invalid(
                "password_policy lengths are inconsistent".to_string(),
            ));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// The configured key, or a fresh one if none is set
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        match &self.signing_key_hex {
            Some(key) => Ok(SigningKey::from_hex(key)?),
            None => {
                warn!(
                    "No signing key configured ({}); using an ephemeral key, tokens will not survive a restart",
                    ENV_SIGNING_KEY
                );
                Ok(SigningKey::generate()?)
            }
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn CredentialStore>, ConfigError> {
        let store: Arc<dyn CredentialStore> = match &self.store_path {
            Some(path) => Arc::new(FileCredentialStore::open(path.clone())?),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        Ok(store)
    }

    /// Wire the store, hasher and token issuer together
    pub fn build_service(&self) -> Result<AuthService, ConfigError> {
        self.validate()?;
        let issuer = TokenIssuer::new(self.signing_key()?, self.token_ttl());
        let hasher = PasswordHasher::new(self.hash.to_algorithm());
        let service = AuthService::new(
            self.open_store()?,
            hasher,
            issuer,
            self.password_policy.clone(),
        )?;
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::{tempdir, NamedTempFile};

    fn cheap_config() -> AuthConfig {
        AuthConfig {
            hash: HashConfig {
                memory_kib: 64,
                iterations: 1,
                ..HashConfig::default()
            },
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl_secs, 3600);
        assert!(config.signing_key_hex.is_none());
        assert!(config.store_path.is_none());
        assert_eq!(config.hash.algorithm, HashAlgorithmKind::Argon2id);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{ "token_ttl_secs": 900, "hash": { "algorithm": "pbkdf2", "pbkdf2_rounds": 5000 } }"#,
        )
        .unwrap();

        let config = AuthConfig::from_file(file.path()).unwrap();
        assert_eq!(config.token_ttl_secs, 900);
        assert_eq!(
            config.hash.to_algorithm(),
            HashAlgorithm::Pbkdf2Sha256 { rounds: 5000 }
        );
        assert_eq!(config.password_policy, PasswordPolicy::default());
    }

    #[test]
    fn test_bad_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "token_ttl_secs = 900").unwrap();
        assert!(matches!(
            AuthConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, String> = HashMap::from([
            (ENV_TOKEN_TTL, "120".to_string()),
            (ENV_SIGNING_KEY, "0f".repeat(32)),
            (ENV_STORE_PATH, "/tmp/solo-users.json".to_string()),
        ]);

        let mut config = AuthConfig::default();
        config
            .apply_overrides(|name| vars.get(name).cloned())
            .unwrap();

        assert_eq!(config.token_ttl_secs, 120);
        assert_eq!(config.signing_key_hex, Some("0f".repeat(32)));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/solo-users.json")));

        let mut config = AuthConfig::default();
        let result = config.apply_overrides(|name| {
            (name == ENV_TOKEN_TTL).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = AuthConfig {
            token_ttl_secs: 30,
            ..AuthConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.token_ttl_secs = MAX_TOKEN_TTL + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.token_ttl_secs = 900;
        config.signing_key_hex = Some("abcd".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Key(_))));

        config.signing_key_hex = None;
        config.hash.iterations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.hash.iterations = 1;
        config.hash.memory_kib = u32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.hash.memory_kib = 64;
        config.hash.algorithm = HashAlgorithmKind::Pbkdf2;
        config.hash.pbkdf2_rounds = u32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.hash.pbkdf2_rounds = 1_000;
        assert!(config.validate().is_ok());
        config.password_policy.min_length = 200;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AuthConfig {
            signing_key_hex: Some("ab".repeat(32)),
            ..AuthConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(&"ab".repeat(32)));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_configured_key_is_stable() {
        let config = AuthConfig {
            signing_key_hex: Some("42".repeat(32)),
            ..cheap_config()
        };

        let first = config.build_service().unwrap();
        first.register("alice@x.com", "Secret123!").unwrap();
        let token = first.login("alice@x.com", "Secret123!").unwrap();

        // A second service with the same key accepts the token
        let second = config.build_service().unwrap();
        assert!(second.authenticate(&token.encode()).is_ok());
    }

    #[test]
    fn test_build_with_file_store() {
        let dir = tempdir().unwrap();
        let config = AuthConfig {
            signing_key_hex: Some("42".repeat(32)),
            store_path: Some(dir.path().join("users.json")),
            ..cheap_config()
        };

        let record = {
            let service = config.build_service().unwrap();
            service.register("bob@x.com", "Secret123!").unwrap()
        };

        let service = config.build_service().unwrap();
        let token = service.login("bob@x.com", "Secret123!").unwrap();
        assert_eq!(service.authenticate(&token.encode()), Ok(record.id));
    }
}
