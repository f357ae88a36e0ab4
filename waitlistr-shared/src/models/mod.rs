/// Database models
///
/// - `user`: project owners
/// - `project`: waitlists and their public identifiers
/// - `api_key`: per-project submission keys
/// - `waitlist_entry`: submitted emails, per project or global
///
/// # Example
///
/// ```no_run
/// use waitlistr_shared::models::project::{CreateProject, Project};
/// use waitlistr_shared::models::api_key::ApiKey;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner_id: i64) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     owner_id,
///     name: "Launch".to_string(),
///     description: "Pre-launch signups".to_string(),
///     url: None,
/// })
/// .await?;
///
/// let (_key, plaintext) = ApiKey::create(&pool, project.id, None).await?;
/// # Ok(())
/// # }
/// ```

pub mod api_key;
pub mod project;
pub mod user;
pub mod waitlist_entry;
