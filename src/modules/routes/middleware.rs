use serde::Deserialize;

use super::Request;
use crate::modules::auth::{validate_identifier, validate_password, AuthError, AuthService};
use crate::modules::store::UserId;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub identifier: String,
    pub password: String,
}

fn parse_body<T: for<'de> Deserialize<'de>>(request: &Request) -> Result<T, AuthError> {
    serde_json::from_value(request.body.clone()).map_err(|_| {
        AuthError::InvalidInput("Request body must contain identifier and password".to_string())
    })
}

/// Reject malformed registration bodies before they reach the service
pub fn validate_register(
    service: &AuthService,
    request: &Request,
) -> Result<RegisterPayload, AuthError> {
    let payload: RegisterPayload = parse_body(request)?;
    validate_identifier(&payload.identifier)
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;
    validate_password(&payload.password, service.password_policy())
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;
    Ok(payload)
}

/// Login bodies only need both fields present and of sane length; strength
/// rules are not re-checked here.
pub fn validate_login(service: &AuthService, request: &Request) -> Result<LoginPayload, AuthError> {
    let payload: LoginPayload = parse_body(request)?;
    if payload.identifier.trim().is_empty() {
        return Err(AuthError::InvalidInput("Identifier is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AuthError::InvalidInput("Password is required".to_string()));
    }
    if payload.password.chars().count() > service.password_policy().max_length {
        return Err(AuthError::InvalidInput("Password is too long".to_string()));
    }
    Ok(payload)
}

/// Extract the bearer token and resolve it to a subject
pub fn authenticate_token(service: &AuthService, request: &Request) -> Result<UserId, AuthError> {
    let header = request
        .header("authorization")
        .ok_or(AuthError::Unauthorized)?;

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::Unauthorized);
    }

    service.authenticate(token.trim())
}
