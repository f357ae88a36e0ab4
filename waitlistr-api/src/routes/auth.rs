/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a project owner
/// - `POST /auth/login` - Exchange credentials for tokens
/// - `POST /auth/refresh` - New access token from a refresh token
/// - `POST /auth/change-password` - Replace the password (bearer)
/// - `GET /auth/user` - Current user profile (bearer)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{DataResponse, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use waitlistr_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, User},
};

const BAD_CREDENTIALS: &str = "Check your email and password and try again.";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Defaults to `email`
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(length(min = 8, max = 50, message = "Password must be 8-50 characters"))]
    pub password: String,

    #[validate(url(message = "Invalid image URL"))]
    pub img_url: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, max = 50, message = "Password must be 8-50 characters"))]
    pub old_password: String,

    #[validate(length(min = 8, max = 50, message = "Password must be 8-50 characters"))]
    pub new_password: String,

    #[validate(length(min = 8, max = 50, message = "Password must be 8-50 characters"))]
    pub confirm_password: String,
}

/// Public view of a [`User`]
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub img_url: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            img_url: user.img_url,
        }
    }
}

fn user_exists() -> ApiError {
    ApiError::BadRequest("User already exists".to_string())
}

/// Register a new project owner
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "owner@example.com",
///   "full_name": "Jane Doe",
///   "password": "correct-horse"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "message": "User created successfully!",
///   "data": { "access_token": "eyJ...", "refresh_token": "eyJ..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email or username already taken
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<TokenPair>>)> {
    req.validate()?;
    password::check_password_length(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let username = req.username.clone().unwrap_or_else(|| req.email.clone());

    if User::exists_by_email_or_username(&state.db, &req.email, &username).await? {
        return Err(user_exists());
    }

    let hashed_password = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email: req.email,
            full_name: req.full_name,
            hashed_password,
            img_url: req.img_url,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent sign-up
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => user_exists(),
        other => other.into(),
    })?;

    tracing::info!(user_id = user.id, "User registered");

    let tokens = jwt::issue_token_pair(user.id, &user.username, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("User created successfully!", tokens)),
    ))
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<DataResponse<TokenPair>>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest(BAD_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.hashed_password)? {
        tracing::debug!(user_id = user.id, "Login rejected");
        return Err(ApiError::BadRequest(BAD_CREDENTIALS.to_string()));
    }

    let tokens = jwt::issue_token_pair(user.id, &user.username, state.jwt_secret())?;

    Ok(Json(DataResponse::new("Login successful", tokens)))
}

/// Token refresh endpoint
///
/// Returns a new access token alongside the unchanged refresh token.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid, expired or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<DataResponse<TokenPair>>> {
    let access_token = jwt::refresh_access_token(&req.refresh, state.jwt_secret())?;

    Ok(Json(DataResponse::new(
        "Token refreshed successfully",
        TokenPair {
            access_token,
            refresh_token: req.refresh,
        },
    )))
}

/// Password change for the authenticated user
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    if req.new_password != req.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    if !password::verify_password(&req.old_password, &user.hashed_password)? {
        return Err(ApiError::BadRequest(
            "Check your old password and try again.".to_string(),
        ));
    }

    let hashed_password = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, user.id, &hashed_password).await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse::new("Password changed successfully!")))
}

/// Profile of the authenticated user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DataResponse<UserProfile>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(DataResponse::new(
        "User retrieved successfully",
        UserProfile::from(user),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "owner@example.com".to_string(),
            username: None,
            full_name: "Jane Doe".to_string(),
            password: "correct-horse".to_string(),
            img_url: None,
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request().validate().is_ok());

        let mut req = register_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());

        let mut req = register_request();
        req.password = "short".to_string();
        assert!(req.validate().is_err());

        let mut req = register_request();
        req.password = "x".repeat(51);
        assert!(req.validate().is_err());

        let mut req = register_request();
        req.img_url = Some("not a url".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_change_password_lengths() {
        let req = ChangePasswordRequest {
            old_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "short".to_string(),
        };
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_user_profile_omits_password() {
        let now = chrono::Utc::now();
        let profile = UserProfile::from(User {
            id: 1,
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            full_name: "Jane".to_string(),
            hashed_password: "$argon2id$...".to_string(),
            img_url: None,
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["username"], "jane");
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("created_at").is_none());
    }
}
