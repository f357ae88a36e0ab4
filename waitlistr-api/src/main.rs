//! # MyWaitlistr API Server
//!
//! Starts the HTTP server together with the in-process export runner.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p waitlistr-api
//! ```

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waitlistr_api::{
    app::{build_router, AppState},
    config::Config,
};
use waitlistr_shared::{
    db::{migrations, pool},
    jobs::redis_store::RedisJobStatusStore,
    redis::{client::sanitize_url, RedisClient},
};
use waitlistr_worker::{storage::S3ArtifactStore, ExportRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "waitlistr_api=debug,waitlistr_worker=debug,waitlistr_shared=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "MyWaitlistr API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    tracing::info!(
        database = %pool::sanitize_database_url(&config.database.url),
        "Connecting to database"
    );
    let db = pool::create_pool(&config.pool_settings()).await?;
    migrations::run_migrations(&db).await?;

    tracing::info!(redis = %sanitize_url(&config.redis.url), "Connecting to Redis");
    let redis = RedisClient::connect(config.redis_config()).await?;
    let job_statuses = Arc::new(RedisJobStatusStore::new(redis, config.job_ttl()));

    let artifacts = Arc::new(S3ArtifactStore::new(&config.s3_settings())?);
    let runner = ExportRunner::start(job_statuses.clone(), artifacts, config.runner_config());

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config, job_statuses, runner.queue());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining exports");
    runner.shutdown().await;
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
