/// API key management endpoints
///
/// Keys belong to a project and are managed by the project owner. The
/// plaintext is returned once, by create; afterwards only `key_prefix` is
/// shown.
///
/// # Endpoints
///
/// - `GET /api_key/:project_uiid/list`
/// - `POST /api_key/:project_uiid/create`
/// - `PATCH /api_key/:project_uiid/:pk/alias?alias=...`
/// - `DELETE /api_key/:project_uiid/:pk`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{projects::owned_project, DataResponse, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use waitlistr_shared::{auth::middleware::AuthContext, models::api_key::ApiKey};

pub const API_KEY_NOT_FOUND: &str = "API key not found";

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100, message = "Alias must be 1-100 characters"))]
    pub alias: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AliasQuery {
    #[validate(length(min = 1, max = 100, message = "Alias must be 1-100 characters"))]
    pub alias: String,
}

/// Create response: the stored key plus its plaintext
#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub api_key: ApiKey,

    /// Only returned here
    pub key: String,
}

pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_uiid): Path<String>,
) -> ApiResult<Json<DataResponse<Vec<ApiKey>>>> {
    let project = owned_project(&state, &project_uiid, auth.user_id).await?;
    let keys = ApiKey::list_by_project(&state.db, project.id).await?;

    Ok(Json(DataResponse::new("API keys retrieved successfully", keys)))
}

/// Creates a key; the body is optional
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_uiid): Path<String>,
    body: Option<Json<CreateApiKeyRequest>>,
) -> ApiResult<(StatusCode, Json<DataResponse<CreatedApiKey>>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let project = owned_project(&state, &project_uiid, auth.user_id).await?;
    let (api_key, key) = ApiKey::create(&state.db, project.id, req.alias).await?;

    tracing::info!(
        project_id = %project.project_id,
        api_key_id = api_key.id,
        key_prefix = %api_key.key_prefix,
        "API key created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(
            "API key created successfully",
            CreatedApiKey { api_key, key },
        )),
    ))
}

pub async fn update_api_key_alias(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_uiid, pk)): Path<(String, i64)>,
    Query(query): Query<AliasQuery>,
) -> ApiResult<Json<DataResponse<ApiKey>>> {
    query.validate()?;

    let project = owned_project(&state, &project_uiid, auth.user_id).await?;
    let api_key = ApiKey::update_alias(&state.db, pk, project.id, &query.alias)
        .await?
        .ok_or_else(|| ApiError::BadRequest(API_KEY_NOT_FOUND.to_string()))?;

    Ok(Json(DataResponse::new(
        "API key alias updated successfully",
        api_key,
    )))
}

/// Deletes a key
///
/// # Errors
///
/// - `400 Bad Request`: project or key not found
/// - `500 Internal Server Error`: the delete itself failed; the message
///   carries the store error
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_uiid, pk)): Path<(String, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    let project = owned_project(&state, &project_uiid, auth.user_id).await?;

    let deleted = ApiKey::delete(&state.db, pk, project.id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if !deleted {
        return Err(ApiError::BadRequest(API_KEY_NOT_FOUND.to_string()));
    }

    tracing::info!(project_id = %project.project_id, api_key_id = pk, "API key deleted");

    Ok(Json(MessageResponse::new("API key deleted successfully")))
}
