/// Waitlist endpoints
///
/// # Endpoints
///
/// - `POST /waitlist/v1/add` - Global list, no authentication
/// - `POST /waitlist/v2/add` - Project list, `api-key` header
/// - `GET /projects/:project_id/waitlist/list?page&size` - Owner listing (bearer)
///
/// A duplicate submission is rejected with 400 "Email already in the
/// waitlist"; the unique indexes on `waitlist_entries` make the final call
/// when two submissions race.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{projects::owned_project, MessageResponse, PageResponse},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;
use waitlistr_shared::{
    auth::middleware::{AuthContext, ProjectKeyContext},
    models::waitlist_entry::WaitlistEntry,
};
use waitlistr_worker::format::ExportRow;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct AddEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: i64,

    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 100, message = "size must be between 1 and 100"))]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

impl PageQuery {
    /// Rows to skip, `None` when `page` is too large to address
    pub fn offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.size)
    }
}

/// Legacy global waitlist
pub async fn add_to_global_waitlist(
    State(state): State<AppState>,
    Json(req): Json<AddEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    WaitlistEntry::add(&state.db, None, &req.email).await?;

    Ok(Json(MessageResponse::new(
        "Email added to waitlist successfully",
    )))
}

/// Per-project waitlist, keyed by the project API key
pub async fn add_to_project_waitlist(
    State(state): State<AppState>,
    Extension(key): Extension<ProjectKeyContext>,
    Json(req): Json<AddEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let entry = WaitlistEntry::add(&state.db, Some(key.project_id), &req.email).await?;

    tracing::info!(
        project_id = key.project_id,
        api_key_id = key.api_key_id,
        entry_id = entry.id,
        "Waitlist entry added"
    );

    Ok(Json(MessageResponse::new(
        "Email added to waitlist successfully!",
    )))
}

/// One page of a project's waitlist, oldest first
///
/// # Errors
///
/// - `400 Bad Request`: project not found, or `page` / `size` out of range
pub async fn list_waitlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<ExportRow>>> {
    query
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let offset = query
        .offset()
        .ok_or_else(|| ApiError::BadRequest("page is out of range".to_string()))?;

    let project = owned_project(&state, &project_id, auth.user_id).await?;

    let entries = WaitlistEntry::list_page(&state.db, project.id, offset, query.size).await?;
    let total = WaitlistEntry::count(&state.db, project.id).await?;

    Ok(Json(PageResponse {
        message: "Waitlist retrieved successfully".to_string(),
        data: entries.into_iter().map(ExportRow::from).collect(),
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: i64, size: i64) -> PageQuery {
        PageQuery { page, size }
    }

    #[test]
    fn test_page_bounds() {
        assert!(page(1, 1).validate().is_ok());
        assert!(page(3, MAX_PAGE_SIZE).validate().is_ok());
        assert!(page(0, 10).validate().is_err());
        assert!(page(1, 0).validate().is_err());
        assert!(page(1, MAX_PAGE_SIZE + 1).validate().is_err());
    }

    #[test]
    fn test_offset() {
        assert_eq!(page(1, 10).offset(), Some(0));
        assert_eq!(page(3, 25).offset(), Some(50));
    }

    #[test]
    fn test_huge_page_has_no_offset() {
        let query = page(i64::MAX, MAX_PAGE_SIZE);
        assert!(query.validate().is_ok());
        assert_eq!(query.offset(), None);
    }

    #[test]
    fn test_page_query_defaults() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!((query.page, query.size), (1, 10));
    }

    #[test]
    fn test_email_validation() {
        assert!(AddEmailRequest { email: "a@x.com".to_string() }.validate().is_ok());
        assert!(AddEmailRequest { email: "a-x.com".to_string() }.validate().is_err());
    }
}
