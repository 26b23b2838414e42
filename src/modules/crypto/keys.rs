use crate::{HmacSha256, HASH_LEN, SALT_LEN, SIGNING_KEY_LEN};
use pbkdf2::pbkdf2;
use rand::Rng;

/// Function to generate a random salt for password hashing
pub fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN).map(|_| rng.gen()).collect()
}

/// Function to generate fresh key material for token signing
pub fn generate_signing_key() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SIGNING_KEY_LEN).map(|_| rng.gen()).collect()
}

/// Function to derive a 32-byte key from the passphrase using PBKDF2
pub fn derive_key_from_passphrase(passphrase: &str, salt: &[u8], rounds: u32) -> Vec<u8> {
    let mut key = vec![0u8; HASH_LEN];

    pbkdf2::<HmacSha256>(passphrase.as_bytes(), salt, rounds, &mut key);

    key
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Only the length is allowed to leak.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation() {
        let passphrase = "MySecurePassword123!";
        let salt = generate_random_salt();

        let key = derive_key_from_passphrase(passphrase, &salt, 1_000);
        assert_eq!(key.len(), HASH_LEN);

        let key2 = derive_key_from_passphrase(passphrase, &salt, 1_000);
        assert_eq!(key, key2);

        let different_passphrase = "DifferentPassword456!";
        let key3 = derive_key_from_passphrase(different_passphrase, &salt, 1_000);
        assert_ne!(key, key3);

        let different_salt = generate_random_salt();
        let key4 = derive_key_from_passphrase(passphrase, &different_salt, 1_000);
        assert_ne!(key, key4);

        let key5 = derive_key_from_passphrase(passphrase, &salt, 1_001);
        assert_ne!(key, key5);
    }

    #[test]
    fn test_random_generation() {
        let salt1 = generate_random_salt();
        let salt2 = generate_random_salt();
        assert_eq!(salt1.len(), SALT_LEN);
        assert_ne!(salt1, salt2);

        let key1 = generate_signing_key();
        let key2 = generate_signing_key();
        assert_eq!(key1.len(), SIGNING_KEY_LEN);
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"same bytes", b"same bytes"));
        assert!(!constant_time_eq(b"same bytes", b"same bytez"));
        assert!(!constant_time_eq(b"short", b"shorter"));
    }
}
