/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use waitlistr_api::{app::AppState, config::Config};
/// use waitlistr_shared::jobs::memory_store::InMemoryJobStatusStore;
/// use waitlistr_worker::{ExportRunner, ExportRunnerConfig};
/// use waitlistr_worker::storage::InMemoryArtifactStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let statuses = Arc::new(InMemoryJobStatusStore::default());
/// let runner = ExportRunner::start(
///     statuses.clone(),
///     Arc::new(InMemoryArtifactStore::new()),
///     ExportRunnerConfig::default(),
/// );
/// let state = AppState::new(pool, config, statuses, runner.queue());
/// let app = waitlistr_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        auth::{api_key_auth_layer, jwt_auth_layer},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use waitlistr_shared::{auth::middleware::API_KEY_HEADER, jobs::JobStatusStore};
use waitlistr_worker::runner::ExportQueue;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Export job status cache
    pub job_statuses: Arc<dyn JobStatusStore>,

    /// Export submission handle
    pub exports: ExportQueue,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        job_statuses: Arc<dyn JobStatusStore>,
        exports: ExportQueue,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            job_statuses,
            exports,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth/
/// │   ├── POST /register, /login, /refresh
/// │   └── POST /change-password, GET /user        (bearer)
/// ├── /projects/                                   (bearer)
/// │   ├── GET|POST /
/// │   ├── GET|PATCH /:project_id
/// │   ├── GET /:project_id/waitlist/list
/// │   ├── GET /:project_id/waitlist/download
/// │   └── GET /:project_id/waitlist/download/:download_id
/// ├── /api_key/                                    (bearer)
/// │   ├── GET    /:project_uiid/list
/// │   ├── POST   /:project_uiid/create
/// │   ├── PATCH  /:project_uiid/:pk/alias
/// │   └── DELETE /:project_uiid/:pk
/// └── /waitlist/
///     ├── POST /v1/add
///     └── POST /v2/add                             (api-key)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. Compression
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
/// 5. Authentication (per router)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/change-password", post(routes::auth::change_password))
        .route("/user", get(routes::auth::current_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project).patch(routes::projects::update_project),
        )
        .route(
            "/:project_id/waitlist/list",
            get(routes::waitlist::list_waitlist),
        )
        .route(
            "/:project_id/waitlist/download",
            get(routes::downloads::start_download),
        )
        .route(
            "/:project_id/waitlist/download/:download_id",
            get(routes::downloads::download_status),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_key_routes = Router::new()
        .route("/:project_uiid/list", get(routes::api_keys::list_api_keys))
        .route("/:project_uiid/create", post(routes::api_keys::create_api_key))
        .route(
            "/:project_uiid/:pk/alias",
            patch(routes::api_keys::update_api_key_alias),
        )
        .route("/:project_uiid/:pk", delete(routes::api_keys::delete_api_key))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let waitlist_routes = Router::new()
        .route("/v2/add", post(routes::waitlist::add_to_project_waitlist))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api_key_auth_layer,
        ))
        .route("/v1/add", post(routes::waitlist::add_to_global_waitlist));

    let cors = build_cors(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/api_key", api_key_routes)
        .nest("/waitlist", waitlist_routes)
        .fallback(fallback)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn fallback() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
