/// Authentication middleware
///
/// - [`jwt_auth_layer`] validates `Authorization: Bearer <access token>` and
///   inserts an [`AuthContext`] into request extensions.
/// - [`api_key_auth_layer`] resolves the `api-key` header to its project and
///   inserts a [`ProjectKeyContext`]. It fails closed with 400
///   "Invalid API key" before the handler runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use waitlistr_shared::{
    auth::{
        jwt,
        middleware::{extract_api_key, extract_bearer_token, AuthContext, ProjectKeyContext},
    },
    models::api_key::ApiKey,
};

use crate::{app::AppState, error::ApiError};

pub const INVALID_API_KEY: &str = "Invalid API key";

/// JWT authentication middleware layer
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;
    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Project API key middleware layer
pub async fn api_key_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let plaintext = extract_api_key(req.headers())
        .ok_or_else(|| ApiError::BadRequest(INVALID_API_KEY.to_string()))?;

    let api_key = ApiKey::resolve(&state.db, plaintext)
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_API_KEY.to_string()))?;

    let context = ProjectKeyContext::from_api_key(&api_key);
    tracing::debug!(
        api_key_id = context.api_key_id,
        project_id = context.project_id,
        "API key accepted"
    );
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
