pub mod error;
pub mod service;
pub mod validation;

// Re-export the main types and functions
pub use error::AuthError;
pub use service::AuthService;
pub use validation::{
    is_valid_email, validate_identifier, validate_password, IdentifierError, PasswordError,
    PasswordPolicy,
};
