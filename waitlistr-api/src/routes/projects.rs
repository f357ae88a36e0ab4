/// Project endpoints
///
/// Every route is scoped to the authenticated owner. A project owned by
/// someone else is reported exactly like a missing one.
///
/// # Endpoints
///
/// - `GET /projects` - List own projects, oldest first
/// - `POST /projects` - Create a project
/// - `GET /projects/:project_id` - Fetch one project
/// - `PATCH /projects/:project_id` - Update name, description and url

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::DataResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;
use waitlistr_shared::{
    auth::middleware::AuthContext,
    models::project::{CreateProject, Project, UpdateProject},
};

pub const PROJECT_NOT_FOUND: &str = "Project not found";

/// Body of create and update
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,

    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
}

/// Loads a project by public id, failing with 400 unless `owner_id` owns it
pub async fn owned_project(state: &AppState, project_id: &str, owner_id: i64) -> ApiResult<Project> {
    Project::find_by_public_id(&state.db, project_id, owner_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(PROJECT_NOT_FOUND.to_string()))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DataResponse<Vec<Project>>>> {
    let projects = Project::list_by_owner(&state.db, auth.user_id).await?;

    Ok(Json(DataResponse::new(
        "Projects retrieved successfully",
        projects,
    )))
}

/// Creates a project with a fresh public id and the default limit
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Project>>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            owner_id: auth.user_id,
            name: req.name,
            description: req.description,
            url: req.url,
        },
    )
    .await?;

    tracing::info!(
        owner_id = auth.user_id,
        project_id = %project.project_id,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Project created successfully", project)),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<DataResponse<Project>>> {
    let project = owned_project(&state, &project_id, auth.user_id).await?;

    Ok(Json(DataResponse::new(
        "Project retrieved successfully",
        project,
    )))
}

/// Updates name, description and url; the public id never changes
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<Json<DataResponse<Project>>> {
    req.validate()?;

    let project = Project::update(
        &state.db,
        &project_id,
        auth.user_id,
        UpdateProject {
            name: req.name,
            description: req.description,
            url: req.url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::BadRequest(PROJECT_NOT_FOUND.to_string()))?;

    Ok(Json(DataResponse::new(
        "Project updated successfully",
        project,
    )))
}
