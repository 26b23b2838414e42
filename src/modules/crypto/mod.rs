pub mod hasher;
pub mod keys;

pub use hasher::{HashAlgorithm, HashError, HashParams, PasswordHasher};
pub use keys::{constant_time_eq, derive_key_from_passphrase, generate_random_salt, generate_signing_key};

/// Serialize byte buffers as lowercase hex strings
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}
