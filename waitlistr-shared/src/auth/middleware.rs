/// Request credentials
///
/// Two kinds of caller reach the API:
///
/// - **Owners** send `Authorization: Bearer <access token>`. A valid token
///   becomes an [`AuthContext`] in the request extensions.
/// - **Third-party sites** submitting to a waitlist send `api-key: <key>`.
///   A key that resolves to a project becomes a [`ProjectKeyContext`].
///
/// The axum layers that run these checks live in the API crate; this module
/// holds the header parsing and the context types so they can be shared with
/// tests.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use waitlistr_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.username)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use super::jwt::Claims;
use crate::models::api_key::ApiKey;

/// Header carrying a project API key on waitlist submissions
pub const API_KEY_HEADER: &str = "api-key";

/// Authenticated project owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
        }
    }
}

/// Project resolved from an `api-key` header
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectKeyContext {
    pub api_key_id: i64,

    /// Internal project id the key belongs to
    pub project_id: i64,
}

impl ProjectKeyContext {
    pub fn from_api_key(api_key: &ApiKey) -> Self {
        Self {
            api_key_id: api_key.id,
            project_id: api_key.project_id,
        }
    }
}

/// Credential extraction failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,
}

/// Returns the token from an `Authorization: Bearer ...` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Returns the raw `api-key` header value, if any
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingCredentials)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidFormat)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidFormat)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        assert!(extract_api_key(&headers).is_none());

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("  "));
        assert!(extract_api_key(&headers).is_none());

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("wl_abc"));
        assert_eq!(extract_api_key(&headers), Some("wl_abc"));
    }

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new(11, "linus", TokenType::Access);
        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, 11);
        assert_eq!(ctx.username, "linus");
    }
}
