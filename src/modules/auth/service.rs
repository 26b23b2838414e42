use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;

use super::error::AuthError;
use super::validation::{validate_identifier, validate_password, PasswordPolicy};
use crate::modules::crypto::{HashError, HashParams, PasswordHasher};
use crate::modules::store::{CredentialStore, StoreError, UserId, UserRecord};
use crate::modules::tokens::{SessionToken, TokenIssuer};
use crate::modules::utils::logging::log_auth_event;

/// Registration, login and token authentication over a credential store.
///
/// Every method takes `&self`; one instance is meant to be shared between
/// request workers behind an `Arc`.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    policy: PasswordPolicy,
    // Verified against when the identifier is unknown, so both paths cost the same
    dummy_hash: Vec<u8>,
    dummy_params: HashParams,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        policy: PasswordPolicy,
    ) -> Result<Self, HashError> {
        let (dummy_hash, dummy_params) = hasher.hash("solo-auth dummy credential")?;
        Ok(Self {
            store,
            hasher,
            issuer,
            policy,
            dummy_hash,
            dummy_params,
        })
    }

    pub fn password_policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    pub fn token_ttl(&self) -> Duration {
        self.issuer.ttl()
    }

    /// Create a user. Fails with `InvalidInput` on a malformed identifier or
    /// weak password and `Conflict` when the identifier is taken.
    pub fn register(&self, identifier: &str, password: &str) -> Result<UserRecord, AuthError> {
        let identifier = validate_identifier(identifier).map_err(|e| {
            log_auth_event("register", identifier, false, Some(&e.to_string()));
            AuthError::InvalidInput(e.to_string())
        })?;
        validate_password(password, &self.policy).map_err(|e| {
            log_auth_event("register", identifier, false, Some(&e.to_string()));
            AuthError::InvalidInput(e.to_string())
        })?;

        // Cheap early exit; `create` below is still the authority on uniqueness
        match self.store.find_by_identifier(identifier) {
            Ok(_) => {
                log_auth_event("register", identifier, false, Some("identifier taken"));
                return Err(AuthError::Conflict);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => {
                error!("Credential store lookup failed: {}", e);
                return Err(AuthError::Internal);
            }
        }

        let (hash, params) = self.hasher.hash(password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::Internal
        })?;

        match self.store.create(identifier, hash, params) {
            Ok(record) => {
                log_auth_event("register", &record.identifier, true, None);
                Ok(record)
            }
            Err(StoreError::Conflict) => {
                log_auth_event("register", identifier, false, Some("identifier taken"));
                Err(AuthError::Conflict)
            }
            Err(e) => {
                error!("Credential store insert failed: {}", e);
                Err(AuthError::Internal)
            }
        }
    }

    /// Exchange credentials for a session token. Unknown identifiers and wrong
    /// passwords are indistinguishable to the caller.
    pub fn login(&self, identifier: &str, password: &str) -> Result<SessionToken, AuthError> {
        let record = match self.store.find_by_identifier(identifier) {
            Ok(record) => Some(record),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                error!("Credential store lookup failed: {}", e);
                return Err(AuthError::Internal);
            }
        };

        let verified = match &record {
            Some(record) => {
                self.hasher
                    .verify(password, &record.password_hash, &record.hash_params)
            }
            None => {
                let _ = self
                    .hasher
                    .verify(password, &self.dummy_hash, &self.dummy_params);
                false
            }
        };

        match record {
            Some(record) if verified => {
                let token = self.issuer.issue(record.id);
                log_auth_event("login", &record.identifier, true, None);
                Ok(token)
            }
            _ => {
                log_auth_event("login", identifier, false, Some("invalid credentials"));
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Resolve a bearer token to the user it was issued for
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.issuer.verify_encoded(token).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::Unauthorized
        })
    }

    /// Look up the record behind an authenticated subject
    pub fn profile(&self, subject_id: UserId) -> Result<UserRecord, AuthError> {
        match self.store.find_by_id(subject_id) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound) => {
                debug!("Token subject {} no longer exists", subject_id);
                Err(AuthError::Unauthorized)
            }
            Err(e) => {
                error!("Credential store lookup failed: {}", e);
                Err(AuthError::Internal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::crypto::HashAlgorithm;
    use crate::modules::store::MemoryCredentialStore;
    use crate::modules::tokens::SigningKey;
    use crate::modules::utils::time::ManualClock;
    use std::sync::Barrier;
    use std::thread;

    const START: u64 = 1_700_000_000;
    const TTL: u64 = 900;

    fn setup_service() -> (AuthService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let issuer = TokenIssuer::with_clock(
            SigningKey::generate().unwrap(),
            Duration::from_secs(TTL),
            clock.clone(),
        );
        let service = AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            PasswordHasher::for_tests(),
            issuer,
            PasswordPolicy::default(),
        )
        .unwrap();
        (service, clock)
    }

    #[test]
    fn test_register_login_authenticate() {
        let (service, clock) = setup_service();

        let alice = service.register("alice@x.com", "Secret123!").unwrap();
        assert_eq!(alice.identifier, "alice@x.com");

        let token = service.login("alice@x.com", "Secret123!").unwrap();
        assert_eq!(token.expires_at(), START + TTL);

        let encoded = token.encode();
        assert_eq!(service.authenticate(&encoded), Ok(alice.id));
        assert_eq!(service.profile(alice.id).unwrap().identifier, "alice@x.com");

        // Past the TTL the same token is refused
        clock.advance(TTL);
        assert_eq!(service.authenticate(&encoded), Err(AuthError::Unauthorized));
    }

    #[test]
    fn test_login_is_case_insensitive_on_identifier() {
        let (service, _clock) = setup_service();
        let record = service.register("Alice@X.com", "Secret123!").unwrap();

        let token = service.login("alice@x.com", "Secret123!").unwrap();
        assert_eq!(service.authenticate(&token.encode()), Ok(record.id));
    }

    #[test]
    fn test_duplicate_register_conflicts() {
        let (service, _clock) = setup_service();
        service.register("bob@x.com", "Secret123!").unwrap();

        assert_eq!(
            service.register("BOB@x.com", "Other456?").unwrap_err(),
            AuthError::Conflict
        );
    }

    #[test]
    fn test_concurrent_register_single_success() {
        let (service, _clock) = setup_service();
        let threads = 8;
        let barrier = Barrier::new(threads);

        let results: Vec<Result<UserRecord, AuthError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let service = &service;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        service.register("race@x.com", "Secret123!")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| r.as_ref().unwrap_err() == &AuthError::Conflict));
    }

    #[test]
    fn test_bad_credentials_are_indistinguishable() {
        let (service, _clock) = setup_service();
        service.register("carol@x.com", "Secret123!").unwrap();

        let wrong_password = service.login("carol@x.com", "Wrong123!").unwrap_err();
        let unknown_user = service.login("nobody@x.com", "Secret123!").unwrap_err();

        assert_eq!(wrong_password, AuthError::Unauthorized);
        assert_eq!(unknown_user, AuthError::Unauthorized);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.status(), unknown_user.status());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let (service, _clock) = setup_service();

        assert!(matches!(
            service.register("", "Secret123!"),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register("dave@x.com", "short"),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register("not@an-email", "Secret123!"),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_authenticate_rejects_garbage_and_foreign_tokens() {
        let (service, _clock) = setup_service();
        let (other, _other_clock) = setup_service();

        let record = other.register("erin@x.com", "Secret123!").unwrap();
        let foreign = other.login("erin@x.com", "Secret123!").unwrap();
        assert_eq!(other.authenticate(&foreign.encode()), Ok(record.id));

        assert_eq!(service.authenticate(&foreign.encode()), Err(AuthError::Unauthorized));
        assert_eq!(service.authenticate("garbage"), Err(AuthError::Unauthorized));
        assert_eq!(service.authenticate(""), Err(AuthError::Unauthorized));
    }

    #[test]
    fn test_profile_of_unknown_subject() {
        let (service, _clock) = setup_service();
        assert_eq!(
            service.profile(UserId::generate()).unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[test]
    fn test_pbkdf2_service() {
        let issuer = TokenIssuer::new(SigningKey::generate().unwrap(), Duration::from_secs(TTL));
        let service = AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            PasswordHasher::new(HashAlgorithm::Pbkdf2Sha256 { rounds: 1_000 }),
            issuer,
            PasswordPolicy::default(),
        )
        .unwrap();

        let record = service.register("frank@x.com", "Secret123!").unwrap();
        assert!(matches!(record.hash_params, HashParams::Pbkdf2Sha256 { .. }));
        assert!(service.login("frank@x.com", "Secret123!").is_ok());
        assert!(service.login("frank@x.com", "Secret124!").is_err());
    }
}
