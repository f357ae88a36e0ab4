//! # MyWaitlistr Shared Library
//!
//! Types and storage code used by both the API server and the export worker.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, tokens, API keys, request credentials
//! - `db`: connection pool and migrations
//! - `models`: users, projects, API keys, waitlist entries
//! - `redis`: Redis connection wrapper
//! - `jobs`: export job status cache

pub mod auth;
pub mod db;
pub mod jobs;
pub mod models;
pub mod redis;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
