/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: registration, login, token refresh, password change, profile
/// - `projects`: owner-scoped project CRUD
/// - `api_keys`: per-project API key management
/// - `waitlist`: public submissions and owner listing
/// - `downloads`: asynchronous waitlist export

pub mod api_keys;
pub mod auth;
pub mod downloads;
pub mod health;
pub mod projects;
pub mod waitlist;

use serde::{Deserialize, Serialize};

/// `{"message": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// `{"message": ..., "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }
}

/// `{"message": ..., "data": [...], "total": n}`
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub message: String,
    pub data: Vec<T>,
    pub total: i64,
}
