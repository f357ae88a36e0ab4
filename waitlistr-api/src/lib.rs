//! # MyWaitlistr API Server Library
//!
//! HTTP surface for project owners (auth, projects, API keys, exports) and
//! for the public waitlist submission endpoints.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
