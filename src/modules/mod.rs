// Declare all modules
pub mod auth;
pub mod config;
pub mod crypto;
pub mod routes;
pub mod store;
pub mod tokens;
pub mod utils;

// No re-exports here as they're handled in lib.rs
