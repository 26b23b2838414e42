use thiserror::Error;

/// Outcomes callers are allowed to see.
///
/// `Unauthorized` deliberately covers unknown users, wrong passwords and every
/// kind of bad token. `Internal` carries no detail; the cause is logged where
/// it happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("identifier already registered")]
    Conflict,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error")]
    Internal,
}

impl AuthError {
    /// HTTP status class for this outcome
    pub fn status(&self) -> u16 {
        match self {
            AuthError::InvalidInput(_) => 400,
            AuthError::Conflict => 409,
            AuthError::Unauthorized => 401,
            AuthError::Internal => 500,
        }
    }

    /// Message safe to hand back to a client
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(reason) => reason.clone(),
            AuthError::Conflict => "User already exists".to_string(),
            AuthError::Unauthorized => "Invalid credentials".to_string(),
            AuthError::Internal => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidInput("x".into()).status(), 400);
        assert_eq!(AuthError::Conflict.status(), 409);
        assert_eq!(AuthError::Unauthorized.status(), 401);
        assert_eq!(AuthError::Internal.status(), 500);
    }

    #[test]
    fn test_internal_reveals_nothing() {
        assert_eq!(AuthError::Internal.to_string(), "internal error");
        assert_eq!(AuthError::Internal.public_message(), "Internal server error");
    }
}
