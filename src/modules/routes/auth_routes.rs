use serde_json::json;

use super::middleware::{authenticate_token, validate_login, validate_register};
use super::{HandlerResult, Method, Request, Response, Router};
use crate::modules::auth::AuthService;

/// Routes for account registration, login and the caller's own profile.
///
/// `POST {prefix}/register`, `POST {prefix}/login`, `GET {prefix}/profile`.
pub fn auth_router(prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    Router::new()
        .route(Method::Post, &format!("{}/register", prefix), register)
        .route(Method::Post, &format!("{}/login", prefix), login)
        .route(Method::Get, &format!("{}/profile", prefix), profile)
}

// POST /register (public)
fn register(service: &AuthService, request: &Request) -> HandlerResult {
    let payload = validate_register(service, request)?;
    let record = service.register(&payload.identifier, &payload.password)?;
    Ok(Response::json(201, json!({ "userId": record.id })))
}

// POST /login (public)
fn login(service: &AuthService, request: &Request) -> HandlerResult {
    let payload = validate_login(service, request)?;
    let token = service.login(&payload.identifier, &payload.password)?;
    Ok(Response::json(
        200,
        json!({
            "token": token.encode(),
            "tokenType": "Bearer",
            "expiresAt": token.expires_at(),
        }),
    ))
}

// GET /profile (requires token)
fn profile(service: &AuthService, request: &Request) -> HandlerResult {
    let subject_id = authenticate_token(service, request)?;
    let record = service.profile(subject_id)?;
    Ok(Response::json(
        200,
        json!({
            "userId": record.id,
            "identifier": record.identifier,
            "createdAt": record.created_at,
        }),
    ))
}
