/// Waitlist export endpoints
///
/// # Flow
///
/// ```text
/// GET /projects/:project_id/waitlist/download?ext_type=csv
///   -> 200 {"download_id": "..."}          job queued, status "processing"
/// GET /projects/:project_id/waitlist/download/:download_id
///   -> 202 {"status": "processing"}
///   -> 200 {"status": "complete", "download_url": "https://..."}
///   -> 502 export failed
///   -> 404 unknown or expired
/// ```
///
/// The entries are read when the export is requested; later submissions do
/// not appear in that file.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::owned_project,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use waitlistr_shared::{
    auth::middleware::AuthContext,
    jobs::{JobId, JobStatus},
    models::waitlist_entry::WaitlistEntry,
};
use waitlistr_worker::format::{ExportFormat, ExportRow};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub ext_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadStarted {
    pub download_id: JobId,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadStatus {
    Processing,
    Complete { download_url: String },
}

fn parse_format(ext_type: Option<&str>) -> ApiResult<ExportFormat> {
    let raw = ext_type.unwrap_or_default();
    raw.parse::<ExportFormat>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Starts an export of the project's waitlist
///
/// # Errors
///
/// - `400 Bad Request`: project not found, or `ext_type` not one of
///   csv, json, xml (checked before anything is written)
/// - `503 Service Unavailable`: status cache down or export queue full
pub async fn start_download(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Json<DownloadStarted>> {
    let format = parse_format(query.ext_type.as_deref())?;
    let project = owned_project(&state, &project_id, auth.user_id).await?;

    let rows: Vec<ExportRow> = WaitlistEntry::list_all(&state.db, project.id)
        .await?
        .into_iter()
        .map(ExportRow::from)
        .collect();

    let download_id = state
        .exports
        .start_export(auth.user_id, &project.project_id, format, rows)
        .await?;

    Ok(Json(DownloadStarted { download_id }))
}

/// Polls an export started by [`start_download`]
pub async fn download_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, download_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<DownloadStatus>)> {
    owned_project(&state, &project_id, auth.user_id).await?;

    let job_id = JobId::from(download_id);

    match state.job_statuses.query(&job_id).await? {
        Some(JobStatus::Processing) => Ok((StatusCode::ACCEPTED, Json(DownloadStatus::Processing))),
        Some(JobStatus::Complete { url }) => Ok((
            StatusCode::OK,
            Json(DownloadStatus::Complete { download_url: url }),
        )),
        Some(JobStatus::Failed { reason }) => {
            Err(ApiError::BadGateway(format!("Export failed: {}", reason)))
        }
        None => Err(ApiError::NotFound(
            "Download not found or expired".to_string(),
        )),
    }
}
