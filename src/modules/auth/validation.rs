use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_IDENTIFIER_LEN: usize = 3;
pub const MAX_IDENTIFIER_LEN: usize = 254;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Identifier shape problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    Empty,
    TooShort,
    TooLong,
    InvalidCharacters,
    InvalidEmail,
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::Empty => write!(f, "Identifier is required"),
            IdentifierError::TooShort => write!(
                f,
                "Identifier must be at least {} characters",
                MIN_IDENTIFIER_LEN
            ),
            IdentifierError::TooLong => write!(
                f,
                "Identifier must be at most {} characters",
                MAX_IDENTIFIER_LEN
            ),
            IdentifierError::InvalidCharacters => {
                write!(f, "Identifier must not contain whitespace or control characters")
            }
            IdentifierError::InvalidEmail => write!(f, "Identifier is not a valid email address"),
        }
    }
}

/// Password strength problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    Empty,
    TooShort(usize),
    TooLong(usize),
    NoUppercase,
    NoLowercase,
    NoNumber,
    NoSpecialChar,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::Empty => write!(f, "Password is required"),
            PasswordError::TooShort(min) => {
                write!(f, "Password must be at least {} characters", min)
            }
            PasswordError::TooLong(max) => write!(f, "Password must be at most {} characters", max),
            PasswordError::NoUppercase => {
                write!(f, "Password must contain an uppercase letter")
            }
            PasswordError::NoLowercase => write!(f, "Password must contain a lowercase letter"),
            PasswordError::NoNumber => write!(f, "Password must contain a number"),
            PasswordError::NoSpecialChar => {
                write!(f, "Password must contain a special character")
            }
        }
    }
}

/// Rules a new password has to satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_complexity: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_complexity: true,
        }
    }
}

/// Helper function to validate email format
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(' ')
        && email.chars().filter(|&c| c == '@').count() == 1
        && email.len() >= 5
}

/// Check identifier shape and return it trimmed
pub fn validate_identifier(identifier: &str) -> Result<&str, IdentifierError> {
    let identifier = identifier.trim();
    let length = identifier.chars().count();

    if identifier.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if length < MIN_IDENTIFIER_LEN {
        return Err(IdentifierError::TooShort);
    }
    if length > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong);
    }
    if identifier
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(IdentifierError::InvalidCharacters);
    }
    if identifier.contains('@') && !is_valid_email(identifier) {
        return Err(IdentifierError::InvalidEmail);
    }
    Ok(identifier)
}

/// Function to validate password strength against a policy
pub fn validate_password(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordError> {
    let length = password.chars().count();

    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if length < policy.min_length {
        return Err(PasswordError::TooShort(policy.min_length));
    }
    if length > policy.max_length {
        return Err(PasswordError::TooLong(policy.max_length));
    }
    if !policy.require_complexity {
        return Ok(());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordError::NoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordError::NoLowercase);
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err(PasswordError::NoNumber);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(PasswordError::NoSpecialChar);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_validation() {
        let policy = PasswordPolicy::default();

        // Test valid password
        assert!(validate_password("Secret123!", &policy).is_ok());

        assert_eq!(validate_password("", &policy), Err(PasswordError::Empty));
        assert_eq!(
            validate_password("Pass1!", &policy),
            Err(PasswordError::TooShort(8))
        );
        assert_eq!(
            validate_password(&format!("Aa1!{}", "x".repeat(200)), &policy),
            Err(PasswordError::TooLong(128))
        );
        assert_eq!(
            validate_password("password123!", &policy),
            Err(PasswordError::NoUppercase)
        );
        assert_eq!(
            validate_password("PASSWORD123!", &policy),
            Err(PasswordError::NoLowercase)
        );
        assert_eq!(
            validate_password("Password!", &policy),
            Err(PasswordError::NoNumber)
        );
        assert_eq!(
            validate_password("Password123", &policy),
            Err(PasswordError::NoSpecialChar)
        );
    }

    #[test]
    fn test_relaxed_policy() {
        let policy = PasswordPolicy {
            min_length: 4,
            max_length: 16,
            require_complexity: false,
        };
        assert!(validate_password("hunter", &policy).is_ok());
        assert_eq!(
            validate_password("abc", &policy),
            Err(PasswordError::TooShort(4))
        );
    }

    #[test]
    fn test_email_validation() {
        // Valid emails
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.co.uk"));
        assert!(is_valid_email("user+tag@example.com"));

        // Invalid emails
        assert!(!is_valid_email("user@example")); // Missing TLD
        assert!(!is_valid_email("user example.com")); // Contains space
        assert!(!is_valid_email("user")); // No @ symbol
        assert!(!is_valid_email("")); // Empty string
        assert!(!is_valid_email("user@@example.com")); // Multiple @ symbols
        assert!(!is_valid_email("@example.com")); // Empty local part
        assert!(!is_valid_email("user@.com")); // Domain starts with a dot
    }

    #[test]
    fn test_identifier_validation() {
        assert_eq!(validate_identifier("  alice@x.com "), Ok("alice@x.com"));
        assert_eq!(validate_identifier("bob"), Ok("bob"));

        assert_eq!(validate_identifier("   "), Err(IdentifierError::Empty));
        assert_eq!(validate_identifier("ab"), Err(IdentifierError::TooShort));
        assert_eq!(
            validate_identifier(&"a".repeat(255)),
            Err(IdentifierError::TooLong)
        );
        assert_eq!(
            validate_identifier("two words"),
            Err(IdentifierError::InvalidCharacters)
        );
        assert_eq!(
            validate_identifier("tab\there"),
            Err(IdentifierError::InvalidCharacters)
        );
        assert_eq!(
            validate_identifier("alice@x"),
            Err(IdentifierError::InvalidEmail)
        );
    }
}
