// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{
    auth,
    config,
    crypto,
    routes,
    store,
    tokens,
    utils,
};

// Re-export commonly used types
pub use modules::auth::{AuthError, AuthService, PasswordPolicy};
pub use modules::config::AuthConfig;
pub use modules::crypto::{HashAlgorithm, HashParams, PasswordHasher};
pub use modules::routes::{auth_router, Method, Request, Response, Router};
pub use modules::store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, UserId, UserRecord,
};
pub use modules::tokens::{SessionToken, SigningKey, TokenError, TokenIssuer};

// Constants
pub const USERS_FILE: &str = "users.json";
pub const DEFAULT_ROUTE_PREFIX: &str = "/api/auth";
pub const DEFAULT_TOKEN_TTL: u64 = 3600;
pub const MIN_TOKEN_TTL: u64 = 60;
pub const MAX_TOKEN_TTL: u64 = 86_400;
pub const SIGNING_KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
