/// Middleware for the API server
///
/// - `security`: response security headers
/// - `auth`: bearer token and project API key authentication

pub mod auth;
pub mod security;
