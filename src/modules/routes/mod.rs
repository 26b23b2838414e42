pub mod auth_routes;
pub mod middleware;

use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

use crate::modules::auth::{AuthError, AuthService};

pub use auth_routes::auth_router;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A parsed request, independent of any HTTP server
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    headers: HashMap<String, String>,
    pub body: Value,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: Value::Null,
        }
    }

    /// Header names are case-insensitive
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }
}

impl From<AuthError> for Response {
    fn from(error: AuthError) -> Self {
        Response::error(error.status(), &error.public_message())
    }
}

pub type HandlerResult = Result<Response, AuthError>;

/// Handlers are plain functions; the router owns no state of its own
pub type Handler = fn(&AuthService, &Request) -> HandlerResult;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// Explicit `(method, path)` to handler table
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, path: &str, handler: Handler) -> Self {
        self.routes.push(Route {
            method,
            path: normalize_path(path).to_string(),
            handler,
        });
        self
    }

    /// Registered `(method, path)` pairs in registration order
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect()
    }

    pub fn dispatch(&self, service: &AuthService, request: &Request) -> Response {
        let path = normalize_path(&request.path);
        let mut path_known = false;

        for route in self.routes.iter().filter(|r| r.path == path) {
            path_known = true;
            if route.method == request.method {
                return (route.handler)(service, request).unwrap_or_else(Response::from);
            }
        }

        if path_known {
            Response::error(405, "Method not allowed")
        } else {
            Response::error(404, "Not found")
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| format!("{} {}", r.method, r.path)))
            .finish()
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
