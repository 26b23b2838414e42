pub mod issuer;
pub mod key;
pub mod token;

// Re-export the main types
pub use issuer::TokenIssuer;
pub use key::{KeyError, SigningKey};
pub use token::{SessionToken, TokenError};
